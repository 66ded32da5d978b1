//! Service provider and scopes
//!
//! The root provider caches singletons; each scope caches its scoped
//! instances. Transient services are built on every resolution. Handles
//! given to proxies hold only weak references, so dropping a scope releases
//! its instances even while proxies created in it are still around.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use application::{Instance, ResolutionContext, ResolutionError};
use domain::{ServiceKey, ServiceLifetime};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::collection::ServiceDescriptor;

type InstanceCache = Mutex<HashMap<ServiceKey, Instance>>;

/// Build through `descriptor`, caching the result in `cache`
///
/// The cache lock is not held while the factory runs, so factories may
/// resolve their own dependencies. If two threads race, the first stored
/// instance wins and both return it.
fn cached(
    cache: &InstanceCache,
    descriptor: &ServiceDescriptor,
    context: &dyn ResolutionContext,
) -> Result<Instance, ResolutionError> {
    let service = descriptor.service();
    if let Some(instance) = cache.lock().get(&service) {
        return Ok(Arc::clone(instance));
    }

    let created = descriptor.create(context)?;
    debug!(
        service = %service,
        lifetime = %descriptor.lifetime(),
        "Service instance created"
    );
    Ok(Arc::clone(cache.lock().entry(service).or_insert(created)))
}

struct Root {
    descriptors: HashMap<ServiceKey, ServiceDescriptor>,
    singletons: InstanceCache,
    this: Weak<Root>,
}

impl Root {
    fn descriptor(&self, service: ServiceKey) -> Result<&ServiceDescriptor, ResolutionError> {
        self.descriptors
            .get(&service)
            .ok_or_else(|| ResolutionError::not_registered(service.short_name()))
    }

    fn singleton(&self, descriptor: &ServiceDescriptor) -> Result<Instance, ResolutionError> {
        cached(&self.singletons, descriptor, self)
    }
}

impl ResolutionContext for Root {
    fn resolve_instance(&self, service: ServiceKey) -> Result<Instance, ResolutionError> {
        let descriptor = self.descriptor(service)?;
        trace!(service = %service, lifetime = %descriptor.lifetime(), "Resolving from root");
        match descriptor.lifetime() {
            ServiceLifetime::Singleton => self.singleton(descriptor),
            ServiceLifetime::Scoped => Err(ResolutionError::ScopedFromRoot {
                service: service.short_name(),
            }),
            ServiceLifetime::Transient => descriptor.create(self),
        }
    }

    fn handle(&self) -> Arc<dyn ResolutionContext> {
        Arc::new(RootHandle(Weak::clone(&self.this)))
    }
}

struct RootHandle(Weak<Root>);

impl ResolutionContext for RootHandle {
    fn resolve_instance(&self, service: ServiceKey) -> Result<Instance, ResolutionError> {
        self.0
            .upgrade()
            .ok_or(ResolutionError::ScopeDisposed)?
            .resolve_instance(service)
    }

    fn handle(&self) -> Arc<dyn ResolutionContext> {
        Arc::new(Self(Weak::clone(&self.0)))
    }
}

/// Root of the container, built from a [`ServiceCollection`](super::ServiceCollection)
///
/// Cloning is cheap and shares the singleton cache.
#[derive(Clone)]
pub struct ServiceProvider {
    root: Arc<Root>,
}

impl ServiceProvider {
    /// Build a provider from registrations; later registrations of the same
    /// service replace earlier ones
    pub fn new(descriptors: impl IntoIterator<Item = ServiceDescriptor>) -> Self {
        let descriptors: HashMap<ServiceKey, ServiceDescriptor> = descriptors
            .into_iter()
            .map(|descriptor| (descriptor.service(), descriptor))
            .collect();
        debug!(services = descriptors.len(), "Service provider built");

        Self {
            root: Arc::new_cyclic(|this| Root {
                descriptors,
                singletons: Mutex::new(HashMap::new()),
                this: Weak::clone(this),
            }),
        }
    }

    /// Open a new scope
    pub fn create_scope(&self) -> ServiceScope {
        ServiceScope {
            state: Arc::new_cyclic(|this| ScopeState {
                root: Arc::clone(&self.root),
                scoped: Mutex::new(HashMap::new()),
                this: Weak::clone(this),
            }),
        }
    }

    /// Whether a registration exists for `service`
    pub fn is_registered(&self, service: ServiceKey) -> bool {
        self.root.descriptors.contains_key(&service)
    }

    /// Lifetime registered for `service`
    pub fn lifetime_of(&self, service: ServiceKey) -> Option<ServiceLifetime> {
        self.root.descriptors.get(&service).map(ServiceDescriptor::lifetime)
    }
}

impl ResolutionContext for ServiceProvider {
    fn resolve_instance(&self, service: ServiceKey) -> Result<Instance, ResolutionError> {
        self.root.resolve_instance(service)
    }

    fn handle(&self) -> Arc<dyn ResolutionContext> {
        self.root.handle()
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.root.descriptors.len())
            .field("singletons", &self.root.singletons.lock().len())
            .finish()
    }
}

struct ScopeState {
    root: Arc<Root>,
    scoped: InstanceCache,
    this: Weak<ScopeState>,
}

impl ResolutionContext for ScopeState {
    fn resolve_instance(&self, service: ServiceKey) -> Result<Instance, ResolutionError> {
        let descriptor = self.root.descriptor(service)?;
        trace!(service = %service, lifetime = %descriptor.lifetime(), "Resolving from scope");
        match descriptor.lifetime() {
            ServiceLifetime::Singleton => self.root.singleton(descriptor),
            ServiceLifetime::Scoped => cached(&self.scoped, descriptor, self),
            ServiceLifetime::Transient => descriptor.create(self),
        }
    }

    fn handle(&self) -> Arc<dyn ResolutionContext> {
        Arc::new(ScopeHandle(Weak::clone(&self.this)))
    }
}

struct ScopeHandle(Weak<ScopeState>);

impl ResolutionContext for ScopeHandle {
    fn resolve_instance(&self, service: ServiceKey) -> Result<Instance, ResolutionError> {
        self.0
            .upgrade()
            .ok_or(ResolutionError::ScopeDisposed)?
            .resolve_instance(service)
    }

    fn handle(&self) -> Arc<dyn ResolutionContext> {
        Arc::new(Self(Weak::clone(&self.0)))
    }
}

/// A resolution scope
///
/// Scoped services resolve to one instance per scope. Dropping the scope
/// disposes it: proxies created inside it fail with
/// [`ResolutionError::ScopeDisposed`] from then on.
pub struct ServiceScope {
    state: Arc<ScopeState>,
}

impl ResolutionContext for ServiceScope {
    fn resolve_instance(&self, service: ServiceKey) -> Result<Instance, ResolutionError> {
        self.state.resolve_instance(service)
    }

    fn handle(&self) -> Arc<dyn ResolutionContext> {
        self.state.handle()
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        trace!(
            scoped = self.state.scoped.lock().len(),
            "Service scope disposed"
        );
    }
}

impl std::fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceScope")
            .field("scoped", &self.state.scoped.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use application::{Implements, Injectable, ResolutionContextExt};

    use super::*;
    use crate::container::ServiceCollection;

    #[derive(Debug)]
    struct Clock;

    impl Injectable for Clock {
        fn create(_: &dyn ResolutionContext) -> Result<Self, ResolutionError> {
            Ok(Self)
        }
    }

    #[derive(Debug)]
    struct Greeter {
        clock: Arc<Clock>,
    }

    impl Injectable for Greeter {
        fn create(context: &dyn ResolutionContext) -> Result<Self, ResolutionError> {
            Ok(Self {
                clock: context.resolve::<Clock>()?,
            })
        }
    }

    trait Named: Send + Sync {
        fn name(&self) -> &'static str;
    }

    impl Named for Clock {
        fn name(&self) -> &'static str {
            "clock"
        }
    }

    impl Implements<dyn Named> for Clock {
        fn into_contract(self: Arc<Self>) -> Arc<dyn Named> {
            self
        }
    }

    #[test]
    fn singleton_is_shared() {
        let provider = ServiceCollection::new().add_singleton::<Clock>().build();
        let first = provider.resolve::<Clock>().unwrap();
        let second = provider.resolve::<Clock>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn singleton_is_shared_between_root_and_scopes() {
        let provider = ServiceCollection::new().add_singleton::<Clock>().build();
        let scope = provider.create_scope();
        let from_scope = scope.resolve::<Clock>().unwrap();
        let from_root = provider.resolve::<Clock>().unwrap();
        assert!(Arc::ptr_eq(&from_scope, &from_root));
    }

    #[test]
    fn transient_is_new_every_time() {
        let provider = ServiceCollection::new().add_transient::<Clock>().build();
        let first = provider.resolve::<Clock>().unwrap();
        let second = provider.resolve::<Clock>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn scoped_is_shared_within_a_scope_only() {
        let provider = ServiceCollection::new().add_scoped::<Clock>().build();
        let first_scope = provider.create_scope();
        let second_scope = provider.create_scope();

        let a = first_scope.resolve::<Clock>().unwrap();
        let b = first_scope.resolve::<Clock>().unwrap();
        let c = second_scope.resolve::<Clock>().unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn scoped_from_root_is_rejected() {
        let provider = ServiceCollection::new().add_scoped::<Clock>().build();
        let err = provider.resolve::<Clock>().unwrap_err();
        assert!(matches!(err, ResolutionError::ScopedFromRoot { .. }));
    }

    #[test]
    fn unregistered_service_fails() {
        let provider = ServiceCollection::new().build();
        let err = provider.resolve::<Clock>().unwrap_err();
        assert_eq!(err, ResolutionError::not_registered("Clock"));
    }

    #[test]
    fn dependencies_resolve_through_the_same_context() {
        let provider = ServiceCollection::new()
            .add_singleton::<Clock>()
            .add_transient::<Greeter>()
            .build();
        let greeter = provider.resolve::<Greeter>().unwrap();
        let clock = provider.resolve::<Clock>().unwrap();
        assert!(Arc::ptr_eq(&greeter.clock, &clock));
    }

    #[test]
    fn contract_resolves_to_implementation() {
        let provider = ServiceCollection::new()
            .add_implementation::<dyn Named, Clock>(ServiceLifetime::Singleton)
            .build();
        assert_eq!(provider.resolve::<dyn Named>().unwrap().name(), "clock");
    }

    #[test]
    fn last_registration_wins() {
        let mut services = ServiceCollection::new();
        services.add_singleton::<Clock>().add_transient::<Clock>();
        let provider = services.build();
        assert_eq!(
            provider.lifetime_of(ServiceKey::of::<Clock>()),
            Some(ServiceLifetime::Transient)
        );
    }

    #[test]
    fn handle_fails_after_scope_is_dropped() {
        let provider = ServiceCollection::new().add_scoped::<Clock>().build();
        let scope = provider.create_scope();
        let handle = scope.handle();
        assert!(handle.resolve::<Clock>().is_ok());

        drop(scope);
        assert_eq!(
            handle.resolve::<Clock>().unwrap_err(),
            ResolutionError::ScopeDisposed
        );
    }

    #[test]
    fn root_handle_fails_after_provider_is_dropped() {
        let provider = ServiceCollection::new().add_singleton::<Clock>().build();
        let handle = provider.handle();
        drop(provider);
        assert_eq!(
            handle.resolve::<Clock>().unwrap_err(),
            ResolutionError::ScopeDisposed
        );
    }

    #[test]
    fn factory_runs_once_per_singleton() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let mut services = ServiceCollection::new();
        services.add(ServiceDescriptor::factory::<Clock, _>(
            ServiceLifetime::Singleton,
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Clock))
            },
        ));
        let provider = services.build();
        let scope = provider.create_scope();

        provider.resolve::<Clock>().unwrap();
        scope.resolve::<Clock>().unwrap();
        provider.resolve::<Clock>().unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn factory_errors_propagate() {
        let mut services = ServiceCollection::new();
        services.add(ServiceDescriptor::factory::<Clock, _>(
            ServiceLifetime::Transient,
            |_| Err(ResolutionError::factory("Clock", "no time")),
        ));
        let provider = services.build();
        assert!(matches!(
            provider.resolve::<Clock>(),
            Err(ResolutionError::Factory { .. })
        ));
    }
}
