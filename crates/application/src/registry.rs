//! Registry of affected services
//!
//! Maps each affected contract to its [`AffectedService`]. Contracts are
//! registered at most once; registering again returns the existing entry
//! with its rules intact.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use domain::{ServiceKey, ServiceLifetime};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::affected_service::AffectedService;
use crate::chaos::{ChaosSettings, SharedSettings};
use crate::ports::{Contract, Implements};

/// Type-erased view of an affected service
pub trait AffectedEntry: Send + Sync {
    /// Registry key of the contract
    fn contract(&self) -> ServiceKey;
    /// Contract name from its descriptor
    fn contract_name(&self) -> &'static str;
    /// Implementation the proxies forward to
    fn implementation(&self) -> ServiceKey;
    /// Lifetime of the contract registration
    fn lifetime(&self) -> ServiceLifetime;
    /// Number of rules
    fn rule_count(&self) -> usize;
    /// Human-readable rules in evaluation order
    fn describe_rules(&self) -> Vec<String>;
    /// Remove every rule
    fn clear_rules(&self);
    /// Upcast for downcasting to the typed service
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<C: Contract + ?Sized> AffectedEntry for AffectedService<C> {
    fn contract(&self) -> ServiceKey {
        Self::contract(self)
    }

    fn contract_name(&self) -> &'static str {
        Self::contract_name(self)
    }

    fn implementation(&self) -> ServiceKey {
        Self::implementation(self)
    }

    fn lifetime(&self) -> ServiceLifetime {
        Self::lifetime(self)
    }

    fn rule_count(&self) -> usize {
        Self::rule_count(self)
    }

    fn describe_rules(&self) -> Vec<String> {
        self.rules().iter().map(ToString::to_string).collect()
    }

    fn clear_rules(&self) {
        Self::clear_rules(self);
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn downcast<C: Contract + ?Sized>(entry: &Arc<dyn AffectedEntry>) -> Option<Arc<AffectedService<C>>> {
    Arc::clone(entry).as_any().downcast::<AffectedService<C>>().ok()
}

/// Result of registering a contract
pub enum Registered<C: Contract + ?Sized> {
    /// The contract was not affected before
    New(Arc<AffectedService<C>>),
    /// The contract was already affected; its entry is returned unchanged
    Existing(Arc<AffectedService<C>>),
}

impl<C: Contract + ?Sized> std::fmt::Debug for Registered<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New(service) => f.debug_tuple("New").field(service).finish(),
            Self::Existing(service) => f.debug_tuple("Existing").field(service).finish(),
        }
    }
}

impl<C: Contract + ?Sized> Registered<C> {
    /// Whether this call created the entry
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }

    /// The affected service, new or existing
    pub fn into_inner(self) -> Arc<AffectedService<C>> {
        match self {
            Self::New(service) | Self::Existing(service) => service,
        }
    }
}

/// Process-wide table of affected contracts
pub struct AffectedServiceRegistry {
    services: RwLock<HashMap<ServiceKey, Arc<dyn AffectedEntry>>>,
    settings: SharedSettings,
}

impl Default for AffectedServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AffectedServiceRegistry {
    /// Create an empty registry with default settings
    pub fn new() -> Self {
        Self::with_settings(ChaosSettings::default())
    }

    /// Create an empty registry with the given settings
    pub fn with_settings(settings: ChaosSettings) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            settings: settings.shared(),
        }
    }

    /// Register contract `C` with implementation `I`, unless already present
    ///
    /// Check and insert happen under one write lock, so concurrent callers
    /// for the same contract end up sharing a single entry. An existing
    /// entry keeps its implementation and lifetime.
    pub fn register<C, I>(&self, lifetime: ServiceLifetime) -> Registered<C>
    where
        C: Contract + ?Sized,
        I: Implements<C>,
    {
        let key = ServiceKey::of::<C>();

        if let Some(existing) = self.services.read().get(&key).and_then(downcast::<C>) {
            warn_if_different::<C, I>(&existing, lifetime);
            return Registered::Existing(existing);
        }

        let mut services = self.services.write();
        if let Some(existing) = services.get(&key).and_then(downcast::<C>) {
            warn_if_different::<C, I>(&existing, lifetime);
            return Registered::Existing(existing);
        }

        let service = Arc::new(AffectedService::<C>::new::<I>(
            lifetime,
            Arc::clone(&self.settings),
        ));
        services.insert(key, Arc::clone(&service) as Arc<dyn AffectedEntry>);
        info!(
            contract = service.contract_name(),
            implementation = %service.implementation(),
            %lifetime,
            "Contract affected"
        );
        Registered::New(service)
    }

    /// The affected service for contract `C`
    pub fn get<C: Contract + ?Sized>(&self) -> Option<Arc<AffectedService<C>>> {
        self.services
            .read()
            .get(&ServiceKey::of::<C>())
            .and_then(downcast::<C>)
    }

    /// Whether contract `C` is affected
    pub fn contains<C: Contract + ?Sized>(&self) -> bool {
        self.services.read().contains_key(&ServiceKey::of::<C>())
    }

    /// Snapshot of all affected services
    pub fn affected_services(&self) -> HashMap<ServiceKey, Arc<dyn AffectedEntry>> {
        self.services.read().clone()
    }

    /// Affected service by contract name
    pub fn find_by_name(&self, contract: &str) -> Option<Arc<dyn AffectedEntry>> {
        self.services
            .read()
            .values()
            .find(|entry| entry.contract_name() == contract)
            .cloned()
    }

    /// Number of affected contracts
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    /// Whether no contract is affected
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Forget every affected contract
    ///
    /// Rules of every entry are cleared as well, so proxies handed out
    /// earlier pass calls straight through from now on.
    pub fn reset(&self) {
        let mut services = self.services.write();
        for entry in services.values() {
            entry.clear_rules();
        }
        let cleared = services.len();
        services.clear();
        info!(cleared, "Chaos registry reset");
    }

    /// Current settings
    pub fn settings(&self) -> Arc<ChaosSettings> {
        self.settings.load_full()
    }

    /// Replace the settings for every affected service at once
    pub fn apply_settings(&self, settings: ChaosSettings) {
        info!(
            enabled = settings.enabled,
            default_probability = settings.default_probability,
            max_delay = ?settings.max_delay,
            "Chaos settings applied"
        );
        self.settings.store(Arc::new(settings));
    }

    /// Switch interception on or off
    pub fn set_enabled(&self, enabled: bool) {
        let current = self.settings();
        self.apply_settings(ChaosSettings {
            enabled,
            ..ChaosSettings::clone(&current)
        });
    }
}

impl std::fmt::Debug for AffectedServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffectedServiceRegistry")
            .field("services", &self.len())
            .field("settings", &self.settings.load())
            .finish()
    }
}

fn warn_if_different<C, I>(existing: &AffectedService<C>, lifetime: ServiceLifetime)
where
    C: Contract + ?Sized,
    I: Implements<C>,
{
    if !existing.implementation().is::<I>() || existing.lifetime() != lifetime {
        warn!(
            contract = existing.contract_name(),
            registered = %existing.implementation(),
            requested = std::any::type_name::<I>(),
            registered_lifetime = %existing.lifetime(),
            requested_lifetime = %lifetime,
            "Contract already affected, keeping the existing registration"
        );
    }
}
