//! Behavior rules

use std::fmt;

use domain::InvocationSignature;

use crate::chaos::{ChaosAction, TriggerPolicy};
use crate::ports::Contract;

/// Signature, action and trigger for one contract
///
/// Immutable once created. A rule is shared by every proxy of its contract,
/// so stateful triggers count calls across all of them.
pub struct BehaviorRule<C: Contract + ?Sized> {
    signature: InvocationSignature,
    action: ChaosAction<C::Error>,
    trigger: TriggerPolicy,
}

impl<C: Contract + ?Sized> BehaviorRule<C> {
    /// Create a rule
    pub const fn new(
        signature: InvocationSignature,
        action: ChaosAction<C::Error>,
        trigger: TriggerPolicy,
    ) -> Self {
        Self {
            signature,
            action,
            trigger,
        }
    }

    /// Which calls the rule applies to
    pub const fn signature(&self) -> &InvocationSignature {
        &self.signature
    }

    /// What happens when the rule fires
    pub const fn action(&self) -> &ChaosAction<C::Error> {
        &self.action
    }

    /// When a matching call fires the rule
    pub const fn trigger(&self) -> &TriggerPolicy {
        &self.trigger
    }
}

impl<C: Contract + ?Sized> fmt::Display for BehaviorRule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}, {}", self.signature, self.action, self.trigger)
    }
}

impl<C: Contract + ?Sized> fmt::Debug for BehaviorRule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorRule")
            .field("signature", &self.signature.to_string())
            .field("action", &self.action)
            .field("trigger", &self.trigger)
            .finish()
    }
}
