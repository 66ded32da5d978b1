//! Chaos actions and the verdicts they produce

use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain::{AuthoringError, Invocation};

use super::latency::LatencyDistribution;

type MakeError<E> = Arc<dyn Fn(&Invocation<'_>) -> E + Send + Sync>;

/// Produces a fresh error value each time a throw rule fires
pub struct ErrorFactory<E> {
    produces: &'static str,
    make: MakeError<E>,
}

impl<E> ErrorFactory<E> {
    /// Build errors with a closure receiving the intercepted invocation
    pub fn new<X, F>(factory: F) -> Self
    where
        E: 'static,
        X: Into<E> + 'static,
        F: Fn(&Invocation<'_>) -> X + Send + Sync + 'static,
    {
        Self {
            produces: type_name::<X>(),
            make: Arc::new(move |invocation: &Invocation<'_>| -> E { factory(invocation).into() }),
        }
    }

    /// Build a default-constructed `X` for every failure
    pub fn default_of<X>() -> Self
    where
        E: 'static,
        X: Default + Into<E> + 'static,
    {
        Self::new(|_| X::default())
    }

    /// Produce a new error for `invocation`
    pub fn make(&self, invocation: &Invocation<'_>) -> E {
        (self.make)(invocation)
    }

    /// Name of the type the factory was declared with
    pub fn produces(&self) -> &'static str {
        self.produces
    }
}

impl<E> Clone for ErrorFactory<E> {
    fn clone(&self) -> Self {
        Self {
            produces: self.produces,
            make: Arc::clone(&self.make),
        }
    }
}

impl<E> fmt::Debug for ErrorFactory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorFactory")
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

/// What a custom action decided for one invocation
#[derive(Debug)]
pub enum ActionOutcome<E> {
    /// Forward to the real implementation
    Proceed,
    /// Wait, then forward to the real implementation
    ProceedAfter(Duration),
    /// Skip the real implementation and fail with the given error
    ShortCircuit(E),
}

/// Extension point for behaviors beyond the built-in actions
pub trait CustomAction<E>: Send + Sync {
    /// Label shown in logs and rule listings
    fn name(&self) -> &str;

    /// Decide the outcome of an intercepted call
    fn apply(&self, invocation: &Invocation<'_>) -> ActionOutcome<E>;
}

struct FnAction<F> {
    name: String,
    apply: F,
}

impl<E, F> CustomAction<E> for FnAction<F>
where
    F: Fn(&Invocation<'_>) -> ActionOutcome<E> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, invocation: &Invocation<'_>) -> ActionOutcome<E> {
        (self.apply)(invocation)
    }
}

/// Behavior applied when a rule fires
pub enum ChaosAction<E> {
    /// Wait, then forward the call
    Delay(LatencyDistribution),
    /// Fail without reaching the real implementation
    Throw(ErrorFactory<E>),
    /// Wait, then fail without reaching the real implementation
    DelayThenThrow {
        latency: LatencyDistribution,
        error: ErrorFactory<E>,
    },
    /// User-provided behavior
    Custom(Arc<dyn CustomAction<E>>),
}

impl<E: 'static> ChaosAction<E> {
    /// Delay by a fixed duration
    pub const fn delay(duration: Duration) -> Self {
        Self::Delay(LatencyDistribution::constant(duration))
    }

    /// Fail with errors built by `factory`
    pub fn throw<X, F>(factory: F) -> Self
    where
        X: Into<E> + 'static,
        F: Fn(&Invocation<'_>) -> X + Send + Sync + 'static,
    {
        Self::Throw(ErrorFactory::new(factory))
    }

    /// Custom behavior from a closure
    pub fn custom<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> ActionOutcome<E> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(FnAction {
            name: name.into(),
            apply,
        }))
    }

    /// Check the action's parameters
    ///
    /// # Errors
    ///
    /// Returns an error if a latency distribution is invalid.
    pub fn validate(&self) -> Result<(), AuthoringError> {
        match self {
            Self::Delay(latency) | Self::DelayThenThrow { latency, .. } => latency.validate(),
            Self::Throw(_) | Self::Custom(_) => Ok(()),
        }
    }

    /// Decide what happens to `invocation`
    ///
    /// Samples latency and builds error values; performs no waiting.
    pub fn plan(&self, invocation: &Invocation<'_>) -> Verdict<E> {
        match self {
            Self::Delay(latency) => Verdict::Proceed {
                delay: Some(latency.sample()),
            },
            Self::Throw(error) => Verdict::Fail {
                delay: None,
                error: error.make(invocation),
            },
            Self::DelayThenThrow { latency, error } => Verdict::Fail {
                delay: Some(latency.sample()),
                error: error.make(invocation),
            },
            Self::Custom(action) => match action.apply(invocation) {
                ActionOutcome::Proceed => Verdict::pass(),
                ActionOutcome::ProceedAfter(delay) => Verdict::Proceed { delay: Some(delay) },
                ActionOutcome::ShortCircuit(error) => Verdict::Fail { delay: None, error },
            },
        }
    }
}

impl<E> Clone for ChaosAction<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Delay(latency) => Self::Delay(*latency),
            Self::Throw(error) => Self::Throw(error.clone()),
            Self::DelayThenThrow { latency, error } => Self::DelayThenThrow {
                latency: *latency,
                error: error.clone(),
            },
            Self::Custom(action) => Self::Custom(Arc::clone(action)),
        }
    }
}

impl<E> fmt::Display for ChaosAction<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delay(latency) => write!(f, "delay {latency}"),
            Self::Throw(error) => write!(f, "throw {}", short_name(error.produces())),
            Self::DelayThenThrow { latency, error } => {
                write!(f, "delay {latency} then throw {}", short_name(error.produces()))
            },
            Self::Custom(action) => write!(f, "custom {}", action.name()),
        }
    }
}

impl<E> fmt::Debug for ChaosAction<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChaosAction({self})")
    }
}

fn short_name(path: &str) -> &str {
    path
        .split('<')
        .next()
        .and_then(|path| path.rsplit("::").next())
        .unwrap_or(path)
}

/// Outcome of interception for a single call
#[derive(Debug)]
pub enum Verdict<E> {
    /// Forward to the real implementation, optionally after a delay
    Proceed { delay: Option<Duration> },
    /// Fail with `error`, optionally after a delay
    Fail { delay: Option<Duration>, error: E },
}

impl<E> Verdict<E> {
    /// Forward immediately
    pub const fn pass() -> Self {
        Self::Proceed { delay: None }
    }

    /// Delay before completing the call, if any
    pub const fn delay(&self) -> Option<Duration> {
        match self {
            Self::Proceed { delay } | Self::Fail { delay, .. } => *delay,
        }
    }

    /// Whether the real implementation will be reached
    pub const fn proceeds(&self) -> bool {
        matches!(self, Self::Proceed { .. })
    }

    /// Limit the delay to `max`
    #[must_use]
    pub fn capped(self, max: Option<Duration>) -> Self {
        let Some(max) = max else {
            return self;
        };
        match self {
            Self::Proceed { delay } => Self::Proceed {
                delay: delay.map(|d| d.min(max)),
            },
            Self::Fail { delay, error } => Self::Fail {
                delay: delay.map(|d| d.min(max)),
                error,
            },
        }
    }

    /// Split into the delay and the failure, if any
    pub fn into_parts(self) -> (Option<Duration>, Option<E>) {
        match self {
            Self::Proceed { delay } => (delay, None),
            Self::Fail { delay, error } => (delay, Some(error)),
        }
    }
}
