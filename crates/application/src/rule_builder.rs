//! Fluent rule authoring
//!
//! ```ignore
//! affected
//!     .when_calling("get_by_id", [with::any::<u32>()])
//!     .slow_it_down_by(Duration::from_secs(5))
//!     .at_random()?
//!     .when_calling("list_all", [])
//!     .throw(|_| CatalogError::Unavailable)
//!     .always()?;
//! ```
//!
//! Each chain appends exactly one rule once its trigger is chosen. Errors in
//! the signature or the action are carried along and reported by that final
//! step.

use std::time::Duration;

use domain::{AuthoringError, Invocation, InvocationSignature};

use crate::affected_service::AffectedService;
use crate::chaos::{
    ChaosAction, CustomAction, ErrorFactory, LatencyDistribution, Probability, TriggerPolicy,
};
use crate::ports::Contract;
use crate::rule::BehaviorRule;

/// First step: choose the action
#[must_use = "a rule is only added once its trigger is chosen"]
pub struct RuleBuilder<'a, C: Contract + ?Sized> {
    service: &'a AffectedService<C>,
    signature: Result<InvocationSignature, AuthoringError>,
}

impl<'a, C: Contract + ?Sized> RuleBuilder<'a, C> {
    pub(crate) const fn new(
        service: &'a AffectedService<C>,
        signature: Result<InvocationSignature, AuthoringError>,
    ) -> Self {
        Self { service, signature }
    }

    /// Delay matching calls by a fixed duration
    pub fn slow_it_down_by(self, duration: Duration) -> TriggerBuilder<'a, C> {
        self.with_latency(LatencyDistribution::constant(duration))
    }

    /// Delay matching calls by a uniformly random duration
    pub fn slow_it_down_between(self, min: Duration, max: Duration) -> TriggerBuilder<'a, C> {
        self.with_latency(LatencyDistribution::uniform(min, max))
    }

    /// Delay matching calls according to a latency distribution
    pub fn with_latency(self, latency: LatencyDistribution) -> TriggerBuilder<'a, C> {
        self.with_action(ChaosAction::Delay(latency))
    }

    /// Fail matching calls with errors built by `factory`
    pub fn throw<X, F>(self, factory: F) -> TriggerBuilder<'a, C>
    where
        X: Into<C::Error> + 'static,
        F: Fn(&Invocation<'_>) -> X + Send + Sync + 'static,
    {
        self.with_action(ChaosAction::Throw(ErrorFactory::new(factory)))
    }

    /// Fail matching calls with a default-constructed `X`
    pub fn throw_error<X>(self) -> TriggerBuilder<'a, C>
    where
        X: Default + Into<C::Error> + 'static,
    {
        self.with_action(ChaosAction::Throw(ErrorFactory::default_of::<X>()))
    }

    /// Delay matching calls, then fail them
    pub fn slow_down_then_throw<X, F>(self, duration: Duration, factory: F) -> TriggerBuilder<'a, C>
    where
        X: Into<C::Error> + 'static,
        F: Fn(&Invocation<'_>) -> X + Send + Sync + 'static,
    {
        self.with_action(ChaosAction::DelayThenThrow {
            latency: LatencyDistribution::constant(duration),
            error: ErrorFactory::new(factory),
        })
    }

    /// Run a custom action on matching calls
    pub fn run(self, action: impl CustomAction<C::Error> + 'static) -> TriggerBuilder<'a, C> {
        self.with_action(ChaosAction::Custom(std::sync::Arc::new(action)))
    }

    /// Apply an already built action
    pub fn with_action(self, action: ChaosAction<C::Error>) -> TriggerBuilder<'a, C> {
        let action = action.validate().map(|()| action);
        TriggerBuilder {
            service: self.service,
            signature: self.signature,
            action,
        }
    }
}

impl<C: Contract + ?Sized> std::fmt::Debug for RuleBuilder<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("contract", &self.service.contract_name())
            .field("signature", &self.signature)
            .finish()
    }
}

/// Second step: choose when the rule fires
#[must_use = "a rule is only added once its trigger is chosen"]
pub struct TriggerBuilder<'a, C: Contract + ?Sized> {
    service: &'a AffectedService<C>,
    signature: Result<InvocationSignature, AuthoringError>,
    action: Result<ChaosAction<C::Error>, AuthoringError>,
}

impl<'a, C: Contract + ?Sized> TriggerBuilder<'a, C> {
    /// Fire on every matching call
    ///
    /// # Errors
    ///
    /// Returns the first authoring error of the chain; no rule is added.
    pub fn always(self) -> Result<&'a AffectedService<C>, AuthoringError> {
        self.finish(Ok(TriggerPolicy::Always))
    }

    /// Fire with the configured default probability
    ///
    /// # Errors
    ///
    /// Returns the first authoring error of the chain; no rule is added.
    pub fn at_random(self) -> Result<&'a AffectedService<C>, AuthoringError> {
        let p = self.service.settings().default_probability;
        self.at_random_with(p)
    }

    /// Fire with probability `p`
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::InvalidProbability`] if `p` is outside
    /// `[0, 1]`, or an earlier error of the chain; no rule is added.
    pub fn at_random_with(self, p: f64) -> Result<&'a AffectedService<C>, AuthoringError> {
        self.finish(Probability::new(p).map(TriggerPolicy::Random))
    }

    /// Fire when `predicate` holds
    ///
    /// # Errors
    ///
    /// Returns the first authoring error of the chain; no rule is added.
    pub fn when<F>(
        self,
        description: impl Into<String>,
        predicate: F,
    ) -> Result<&'a AffectedService<C>, AuthoringError>
    where
        F: Fn(&Invocation<'_>) -> bool + Send + Sync + 'static,
    {
        self.finish(Ok(TriggerPolicy::custom(description, predicate)))
    }

    /// Fire according to an already built policy
    ///
    /// # Errors
    ///
    /// Returns the first authoring error of the chain; no rule is added.
    pub fn with_policy(self, policy: TriggerPolicy) -> Result<&'a AffectedService<C>, AuthoringError> {
        self.finish(Ok(policy))
    }

    fn finish(
        self,
        trigger: Result<TriggerPolicy, AuthoringError>,
    ) -> Result<&'a AffectedService<C>, AuthoringError> {
        let rule = BehaviorRule::new(self.signature?, self.action?, trigger?);
        self.service.add_rule(rule)?;
        Ok(self.service)
    }
}

impl<C: Contract + ?Sized> std::fmt::Debug for TriggerBuilder<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerBuilder")
            .field("contract", &self.service.contract_name())
            .field("signature", &self.signature)
            .field("action", &self.action)
            .finish()
    }
}
