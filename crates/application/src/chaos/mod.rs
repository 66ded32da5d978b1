//! Chaos primitives: what a firing rule does and when it fires
//!
//! Actions and triggers are plain values. They never sleep; the interceptor
//! turns the [`Verdict`] of a fired rule into waiting and failing.

mod action;
mod latency;
mod settings;
mod trigger;

pub use action::{ActionOutcome, ChaosAction, CustomAction, ErrorFactory, Verdict};
pub use latency::LatencyDistribution;
pub use settings::{ChaosSettings, SharedSettings};
pub use trigger::{DEFAULT_TRIGGER_PROBABILITY, Probability, TriggerPolicy};
