//! Trigger policies deciding whether a matched rule fires

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use domain::{AuthoringError, Invocation};
use rand::Rng;

/// Probability used by `at_random()` when none is configured
pub const DEFAULT_TRIGGER_PROBABILITY: f64 = 1.0;

/// A probability in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Probability(f64);

impl Probability {
    /// Fires every time
    pub const ALWAYS: Self = Self(1.0);
    /// Never fires
    pub const NEVER: Self = Self(0.0);

    /// Validate a probability
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::InvalidProbability`] unless `value` is a
    /// finite number in `[0, 1]`.
    pub fn new(value: f64) -> Result<Self, AuthoringError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AuthoringError::InvalidProbability(value))
        }
    }

    /// The probability as a number
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Draw once
    pub fn sample(self) -> bool {
        if self.0 >= 1.0 {
            return true;
        }
        if self.0 <= 0.0 {
            return false;
        }
        rand::rng().random_bool(self.0)
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0 * 100.0)
    }
}

type Predicate = Arc<dyn Fn(&Invocation<'_>) -> bool + Send + Sync>;

/// Decides, for a matched invocation, whether its rule fires
#[derive(Clone)]
pub enum TriggerPolicy {
    /// Fire on every matching call
    Always,
    /// Fire with the given probability, drawn per call
    Random(Probability),
    /// Fire when the predicate holds
    Custom {
        description: String,
        predicate: Predicate,
    },
}

impl TriggerPolicy {
    /// Fire with probability `p`
    ///
    /// # Errors
    ///
    /// Returns an error if `p` is outside `[0, 1]`.
    pub fn random(p: f64) -> Result<Self, AuthoringError> {
        Probability::new(p).map(Self::Random)
    }

    /// Fire when `predicate` holds for the invocation
    pub fn custom<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Fire on every `n`th matching call, starting with the `n`th
    pub fn every_nth(n: u64) -> Self {
        let n = n.max(1);
        let seen = AtomicU64::new(0);
        Self::custom(format!("every {n} calls"), move |_| {
            (seen.fetch_add(1, Ordering::Relaxed) + 1) % n == 0
        })
    }

    /// Let the first `n` matching calls through, then fire on every call
    pub fn after(n: u64) -> Self {
        let seen = AtomicU64::new(0);
        Self::custom(format!("after {n} calls"), move |_| {
            seen.fetch_add(1, Ordering::Relaxed) >= n
        })
    }

    /// Fire on the first `n` matching calls only
    pub fn at_most(n: u64) -> Self {
        let remaining = AtomicU64::new(n);
        Self::custom(format!("at most {n} times"), move |_| {
            remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| r.checked_sub(1))
                .is_ok()
        })
    }

    /// Evaluate the policy for one matched invocation
    pub fn fires(&self, invocation: &Invocation<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::Random(p) => p.sample(),
            Self::Custom { predicate, .. } => predicate(invocation),
        }
    }
}

impl fmt::Display for TriggerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::Random(p) => write!(f, "at random ({p})"),
            Self::Custom { description, .. } => write!(f, "when {description}"),
        }
    }
}

impl fmt::Debug for TriggerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TriggerPolicy({self})")
    }
}
