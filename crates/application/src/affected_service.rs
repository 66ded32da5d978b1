//! Affected services
//!
//! One [`AffectedService`] exists per affected contract. It owns the
//! contract's ordered rule list and builds the proxies the container hands
//! out in place of the real implementation.

use std::sync::Arc;

use arc_swap::ArcSwap;
use domain::{
    ArgumentMatcher, AuthoringError, ContractDescriptor, InvocationSignature, ServiceKey,
    ServiceLifetime,
};
use tracing::info;

use crate::chaos::{ChaosSettings, SharedSettings};
use crate::error::ResolutionError;
use crate::interceptor::{Interceptor, RuleList};
use crate::ports::{Contract, Implements, ResolutionContext, ResolutionContextExt};
use crate::rule::BehaviorRule;
use crate::rule_builder::RuleBuilder;

type ResolveTarget<C> = fn(&dyn ResolutionContext) -> Result<Arc<C>, ResolutionError>;

fn resolve_as<C, I>(context: &dyn ResolutionContext) -> Result<Arc<C>, ResolutionError>
where
    C: Contract + ?Sized,
    I: Implements<C>,
{
    context.resolve::<I>().map(<I as Implements<C>>::into_contract)
}

/// A contract registered for chaos together with its rules
pub struct AffectedService<C: Contract + ?Sized> {
    descriptor: ContractDescriptor,
    implementation: ServiceKey,
    lifetime: ServiceLifetime,
    rules: RuleList<C>,
    settings: SharedSettings,
    resolve_target: ResolveTarget<C>,
}

impl<C: Contract + ?Sized> AffectedService<C> {
    /// Affect contract `C`, forwarding to implementation `I`
    pub fn new<I: Implements<C>>(lifetime: ServiceLifetime, settings: SharedSettings) -> Self {
        Self {
            descriptor: C::descriptor(),
            implementation: ServiceKey::of::<I>(),
            lifetime,
            rules: Arc::new(ArcSwap::from_pointee(Vec::new())),
            settings,
            resolve_target: resolve_as::<C, I>,
        }
    }

    /// Registry key of the contract
    pub fn contract(&self) -> ServiceKey {
        ServiceKey::of::<C>()
    }

    /// Contract name from its descriptor
    pub const fn contract_name(&self) -> &'static str {
        self.descriptor.name()
    }

    /// Method table of the contract
    pub const fn descriptor(&self) -> &ContractDescriptor {
        &self.descriptor
    }

    /// Implementation the proxies forward to
    pub const fn implementation(&self) -> ServiceKey {
        self.implementation
    }

    /// Lifetime of the contract registration
    pub const fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    /// Current settings
    pub fn settings(&self) -> Arc<ChaosSettings> {
        self.settings.load_full()
    }

    /// Snapshot of the rules in registration order
    pub fn rules(&self) -> Arc<Vec<Arc<BehaviorRule<C>>>> {
        self.rules.load_full()
    }

    /// Number of rules
    pub fn rule_count(&self) -> usize {
        self.rules.load().len()
    }

    /// Start authoring a rule for calls to `method` with the given matchers
    ///
    /// Validation is deferred to the end of the chain, so every authoring
    /// error surfaces from the trigger step.
    pub fn when_calling(
        &self,
        method: &str,
        matchers: impl IntoIterator<Item = ArgumentMatcher>,
    ) -> RuleBuilder<'_, C> {
        RuleBuilder::new(self, InvocationSignature::new(method, matchers))
    }

    /// Append a rule
    ///
    /// Rules are only ever appended; evaluation keeps registration order.
    /// Concurrent readers see either the old or the new list, never a
    /// partial one.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule's signature does not fit the contract
    /// or its action has invalid parameters. The rule list is unchanged.
    pub fn add_rule(&self, rule: BehaviorRule<C>) -> Result<(), AuthoringError> {
        self.descriptor.validate(rule.signature())?;
        rule.action().validate()?;

        info!(
            contract = self.contract_name(),
            rule = %rule,
            "Chaos rule registered"
        );

        let rule = Arc::new(rule);
        self.rules.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&rule));
            next
        });
        Ok(())
    }

    /// Remove every rule
    pub fn clear_rules(&self) {
        self.rules.store(Arc::new(Vec::new()));
    }

    /// Interceptor resolving real instances through `context`
    pub fn interceptor(&self, context: Arc<dyn ResolutionContext>) -> Interceptor<C> {
        let resolve_target = self.resolve_target;
        Interceptor::new(
            self.contract_name(),
            Arc::clone(&self.rules),
            Arc::clone(&self.settings),
            Arc::new(move || resolve_target(context.as_ref())),
        )
    }

    /// A proxy for the contract bound to `context`
    ///
    /// This is what the container returns when `C` is resolved. Each call
    /// through the proxy resolves the real implementation from `context`
    /// again, so singleton, scoped and transient lifetimes behave as they
    /// would without chaos.
    pub fn instance(&self, context: &dyn ResolutionContext) -> Arc<C> {
        C::proxy(self.interceptor(context.handle()))
    }
}

impl<C: Contract + ?Sized> std::fmt::Debug for AffectedService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffectedService")
            .field("contract", &self.contract_name())
            .field("implementation", &self.implementation.short_name())
            .field("lifetime", &self.lifetime)
            .field("rules", &self.rule_count())
            .finish_non_exhaustive()
    }
}
