//! Application layer - the interception engine
//!
//! Holds the behavior rules of affected contracts and decides, per proxied
//! call, whether to inject chaos or forward to the real implementation.
//! Resolution of real instances goes through the [`ResolutionContext`] port,
//! implemented by the container in the infrastructure layer.

pub mod affected_service;
pub mod chaos;
pub mod error;
pub mod interceptor;
pub mod ports;
pub mod registry;
pub mod rule;
pub mod rule_builder;
#[cfg(test)]
pub(crate) mod testing;

pub use affected_service::AffectedService;
pub use chaos::{
    ActionOutcome, ChaosAction, ChaosSettings, CustomAction, DEFAULT_TRIGGER_PROBABILITY,
    ErrorFactory, LatencyDistribution, Probability, SharedSettings, TriggerPolicy, Verdict,
};
pub use error::{InjectedFault, ResolutionError};
pub use interceptor::{InterceptedFuture, Interception, Interceptor};
pub use ports::*;
pub use registry::{AffectedEntry, AffectedServiceRegistry, Registered};
pub use rule::BehaviorRule;
pub use rule_builder::{RuleBuilder, TriggerBuilder};
