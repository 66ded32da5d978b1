//! Per-call interception
//!
//! Every proxied method builds an [`Invocation`] and hands it to its
//! [`Interceptor`]. The interceptor scans the contract's rules in
//! registration order; the first rule whose signature matches and whose
//! trigger fires decides the call. Without such a rule the call is forwarded
//! unchanged.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use domain::Invocation;
use tracing::{debug, trace};

use crate::chaos::{SharedSettings, Verdict};
use crate::error::ResolutionError;
use crate::ports::Contract;
use crate::rule::BehaviorRule;

pub(crate) type RuleList<C> = Arc<arc_swap::ArcSwap<Vec<Arc<BehaviorRule<C>>>>>;
pub(crate) type Resolver<C> = Arc<dyn Fn() -> Result<Arc<C>, ResolutionError> + Send + Sync>;

/// Decides the fate of each call made through a proxy
///
/// Holds a live view of the contract's rules, so rules added after the
/// proxy was created apply to its next call.
pub struct Interceptor<C: Contract + ?Sized> {
    contract: &'static str,
    rules: RuleList<C>,
    settings: SharedSettings,
    resolver: Resolver<C>,
}

impl<C: Contract + ?Sized> Interceptor<C> {
    pub(crate) fn new(
        contract: &'static str,
        rules: RuleList<C>,
        settings: SharedSettings,
        resolver: Resolver<C>,
    ) -> Self {
        Self {
            contract,
            rules,
            settings,
            resolver,
        }
    }

    /// Name of the intercepted contract
    pub const fn contract(&self) -> &'static str {
        self.contract
    }

    /// Decide what happens to `invocation`
    ///
    /// Evaluates triggers and samples latency immediately; waiting, failing
    /// and forwarding happen when the returned [`Interception`] is run.
    pub fn intercept(&self, invocation: &Invocation<'_>) -> Interception<'_, C> {
        Interception {
            interceptor: self,
            verdict: self.decide(invocation),
        }
    }

    /// Resolve the real implementation through the proxy's context
    ///
    /// # Errors
    ///
    /// Returns the resolution failure converted into the contract error.
    pub fn target(&self) -> Result<Arc<C>, C::Error> {
        (self.resolver)().map_err(C::Error::from)
    }

    fn decide(&self, invocation: &Invocation<'_>) -> Verdict<C::Error> {
        let settings = self.settings.load();
        if !settings.enabled {
            trace!(contract = self.contract, %invocation, "Chaos disabled, passing through");
            return Verdict::pass();
        }

        let rules = self.rules.load();
        for (index, rule) in rules.iter().enumerate() {
            if !rule.signature().matches(invocation) {
                continue;
            }
            if !rule.trigger().fires(invocation) {
                trace!(contract = self.contract, %invocation, rule = index, "Rule matched but did not fire");
                continue;
            }

            let verdict = rule.action().plan(invocation).capped(settings.max_delay);
            debug!(
                contract = self.contract,
                %invocation,
                rule = index,
                action = %rule.action(),
                delay = ?verdict.delay(),
                "Chaos rule fired"
            );
            return verdict;
        }

        trace!(contract = self.contract, %invocation, "No rule fired, passing through");
        Verdict::pass()
    }
}

impl<C: Contract + ?Sized> Clone for Interceptor<C> {
    fn clone(&self) -> Self {
        Self {
            contract: self.contract,
            rules: Arc::clone(&self.rules),
            settings: Arc::clone(&self.settings),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<C: Contract + ?Sized> fmt::Debug for Interceptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("contract", &self.contract)
            .field("rules", &self.rules.load().len())
            .finish_non_exhaustive()
    }
}

/// The decided outcome of one call, ready to be run
///
/// The real implementation is resolved only on the forwarding path, so a
/// throwing rule never constructs it.
#[must_use = "an interception does nothing until it is run"]
pub struct Interception<'a, C: Contract + ?Sized> {
    interceptor: &'a Interceptor<C>,
    verdict: Verdict<C::Error>,
}

impl<C: Contract + ?Sized> fmt::Debug for Interception<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interception")
            .field("contract", &self.interceptor.contract)
            .field("proceeds", &self.proceeds())
            .field("delay", &self.delay())
            .finish()
    }
}

impl<C: Contract + ?Sized> Interception<'_, C> {
    /// Whether the call will reach the real implementation
    pub const fn proceeds(&self) -> bool {
        self.verdict.proceeds()
    }

    /// Delay injected before the call completes
    pub const fn delay(&self) -> Option<Duration> {
        self.verdict.delay()
    }

    /// Complete a blocking call
    ///
    /// Sleeps the current thread for any injected delay.
    ///
    /// # Errors
    ///
    /// Returns the injected error, a resolution failure, or the error of the
    /// real implementation.
    pub fn run<T>(self, call: impl FnOnce(&C) -> Result<T, C::Error>) -> Result<T, C::Error> {
        let (delay, failure) = self.verdict.into_parts();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if let Some(error) = failure {
            return Err(error);
        }
        let target = self.interceptor.target()?;
        call(&target)
    }

    /// Complete an asynchronous call
    ///
    /// Takes everything the call needs out of the interception up front, so
    /// the returned future holds no reference to the interceptor. Await it
    /// after the statement that created the interception has ended:
    ///
    /// ```ignore
    /// let call = self.0
    ///     .intercept(&Invocation::new("get_by_id", &[&id]))
    ///     .run_async(move |catalog| async move { catalog.get_by_id(id).await });
    /// call.await
    /// ```
    ///
    /// Any injected delay waits on the tokio timer.
    ///
    /// # Errors
    ///
    /// The future resolves to the injected error, a resolution failure, or
    /// the error of the real implementation.
    pub fn run_async<'f, T, F, Fut>(self, call: F) -> InterceptedFuture<'f, T, C::Error>
    where
        F: FnOnce(Arc<C>) -> Fut + Send + 'f,
        Fut: Future<Output = Result<T, C::Error>> + Send + 'f,
        T: Send + 'f,
    {
        let (delay, failure) = self.verdict.into_parts();
        let resolver = Arc::clone(&self.interceptor.resolver);
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            forward(resolver, failure, call).await
        })
    }

    /// Complete an asynchronous call whose delay may be cut short
    ///
    /// When `cancelled` completes during an injected delay the wait ends
    /// early and the call continues as if the delay had elapsed.
    ///
    /// # Errors
    ///
    /// Same as [`run_async`](Self::run_async).
    pub fn run_async_until<'f, T, F, Fut, S>(
        self,
        cancelled: S,
        call: F,
    ) -> InterceptedFuture<'f, T, C::Error>
    where
        F: FnOnce(Arc<C>) -> Fut + Send + 'f,
        Fut: Future<Output = Result<T, C::Error>> + Send + 'f,
        T: Send + 'f,
        S: Future<Output = ()> + Send + 'f,
    {
        let contract = self.interceptor.contract;
        let (delay, failure) = self.verdict.into_parts();
        let resolver = Arc::clone(&self.interceptor.resolver);
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::select! {
                    () = tokio::time::sleep(delay) => {},
                    () = cancelled => {
                        debug!(contract, ?delay, "Injected delay cancelled");
                    },
                }
            }
            forward(resolver, failure, call).await
        })
    }
}

/// Future of a proxied asynchronous call
pub type InterceptedFuture<'f, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'f>>;

/// Fail with `failure`, or resolve the real implementation and call it
///
/// Generic over the error type rather than the contract, so the future
/// carries no contract projections.
async fn forward<C, E, T, F, Fut>(resolver: Resolver<C>, failure: Option<E>, call: F) -> Result<T, E>
where
    C: ?Sized,
    E: From<ResolutionError>,
    F: FnOnce(Arc<C>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(error) = failure {
        return Err(error);
    }
    let target = resolver().map_err(E::from)?;
    call(target).await
}
