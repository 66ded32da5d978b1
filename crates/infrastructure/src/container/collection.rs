//! Service registrations

use std::fmt;
use std::sync::Arc;

use application::{Implements, Injectable, Instance, ResolutionContext, ResolutionError};
use domain::{ServiceKey, ServiceLifetime};

use super::provider::ServiceProvider;

/// Builds the instance for one registration
pub type Factory =
    Arc<dyn Fn(&dyn ResolutionContext) -> Result<Instance, ResolutionError> + Send + Sync>;

/// One registration: a service type, its lifetime and how to build it
#[derive(Clone)]
pub struct ServiceDescriptor {
    service: ServiceKey,
    implementation: Option<ServiceKey>,
    lifetime: ServiceLifetime,
    factory: Factory,
    intercepted: bool,
}

impl ServiceDescriptor {
    /// Register `T` as itself, built through [`Injectable::create`]
    pub fn injectable<T: Injectable>(lifetime: ServiceLifetime) -> Self {
        Self {
            service: ServiceKey::of::<T>(),
            implementation: Some(ServiceKey::of::<T>()),
            lifetime,
            intercepted: false,
            factory: Arc::new(|context: &dyn ResolutionContext| {
                T::create(context).map(|value| Arc::new(Arc::new(value)) as Instance)
            }),
        }
    }

    /// Register contract `C`, served by a new `I` per instance
    pub fn implementation<C, I>(lifetime: ServiceLifetime) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C> + Injectable,
    {
        Self {
            service: ServiceKey::of::<C>(),
            implementation: Some(ServiceKey::of::<I>()),
            lifetime,
            intercepted: false,
            factory: Arc::new(|context: &dyn ResolutionContext| {
                let contract = <I as Implements<C>>::into_contract(Arc::new(I::create(context)?));
                Ok(Arc::new(contract) as Instance)
            }),
        }
    }

    /// Register `T` built by an arbitrary factory
    pub fn factory<T, F>(lifetime: ServiceLifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ResolutionContext) -> Result<Arc<T>, ResolutionError> + Send + Sync + 'static,
    {
        Self {
            service: ServiceKey::of::<T>(),
            implementation: None,
            lifetime,
            intercepted: false,
            factory: Arc::new(move |context: &dyn ResolutionContext| {
                factory(context).map(|value| Arc::new(value) as Instance)
            }),
        }
    }

    /// Register an existing value as a singleton
    pub fn instance<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::factory::<T, _>(ServiceLifetime::Singleton, move |_| Ok(Arc::clone(&value)))
    }

    /// Record the implementation type behind a factory registration
    #[must_use]
    pub fn with_implementation(mut self, implementation: ServiceKey) -> Self {
        self.implementation = Some(implementation);
        self
    }

    /// Mark this registration as serving chaos proxies
    #[must_use]
    pub fn intercepted(mut self) -> Self {
        self.intercepted = true;
        self
    }

    /// Whether this registration serves chaos proxies
    pub const fn is_intercepted(&self) -> bool {
        self.intercepted
    }

    /// Registered service type
    pub const fn service(&self) -> ServiceKey {
        self.service
    }

    /// Implementation type, when known
    pub const fn implementation_key(&self) -> Option<ServiceKey> {
        self.implementation
    }

    /// Registration lifetime
    pub const fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub(crate) fn create(&self, context: &dyn ResolutionContext) -> Result<Instance, ResolutionError> {
        (self.factory)(context)
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service", &self.service.short_name())
            .field(
                "implementation",
                &self.implementation.map(|key| key.short_name()),
            )
            .field("lifetime", &self.lifetime)
            .field("intercepted", &self.intercepted)
            .finish_non_exhaustive()
    }
}

/// Ordered list of registrations, turned into a provider by [`build`](Self::build)
///
/// When a service is registered more than once, the last registration is
/// the one resolved.
#[derive(Debug, Clone, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registration
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Append a registration unless the service is already registered
    ///
    /// Returns `true` if the registration was added.
    pub fn try_add(&mut self, descriptor: ServiceDescriptor) -> bool {
        if self.contains(descriptor.service) {
            return false;
        }
        self.descriptors.push(descriptor);
        true
    }

    /// Replace the first registration of the same service in place
    ///
    /// Appends when the service is not registered yet. Returns the replaced
    /// registration, if any.
    pub fn replace(&mut self, descriptor: ServiceDescriptor) -> Option<ServiceDescriptor> {
        match self
            .descriptors
            .iter_mut()
            .find(|existing| existing.service == descriptor.service)
        {
            Some(existing) => Some(std::mem::replace(existing, descriptor)),
            None => {
                self.descriptors.push(descriptor);
                None
            },
        }
    }

    /// Register `T` as a singleton
    pub fn add_singleton<T: Injectable>(&mut self) -> &mut Self {
        self.add(ServiceDescriptor::injectable::<T>(ServiceLifetime::Singleton))
    }

    /// Register `T` with one instance per scope
    pub fn add_scoped<T: Injectable>(&mut self) -> &mut Self {
        self.add(ServiceDescriptor::injectable::<T>(ServiceLifetime::Scoped))
    }

    /// Register `T` with a new instance per resolution
    pub fn add_transient<T: Injectable>(&mut self) -> &mut Self {
        self.add(ServiceDescriptor::injectable::<T>(ServiceLifetime::Transient))
    }

    /// Register contract `C` served by `I`
    pub fn add_implementation<C, I>(&mut self, lifetime: ServiceLifetime) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C> + Injectable,
    {
        self.add(ServiceDescriptor::implementation::<C, I>(lifetime))
    }

    /// Register an existing value as a singleton
    pub fn add_instance<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        self.add(ServiceDescriptor::instance(value))
    }

    /// Whether a registration exists for `service`
    pub fn contains(&self, service: ServiceKey) -> bool {
        self.descriptors.iter().any(|d| d.service == service)
    }

    /// Whether a registration exists for `T`
    pub fn contains_service<T: ?Sized + 'static>(&self) -> bool {
        self.contains(ServiceKey::of::<T>())
    }

    /// Registrations for `service`, in registration order
    pub fn registrations(&self, service: ServiceKey) -> impl Iterator<Item = &ServiceDescriptor> {
        self.descriptors.iter().filter(move |d| d.service == service)
    }

    /// All registrations
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.descriptors.iter()
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Build the root provider
    pub fn build(&self) -> ServiceProvider {
        ServiceProvider::new(self.descriptors.iter().cloned())
    }
}
