//! Registering contracts for chaos
//!
//! ```ignore
//! let registry = AffectedServiceRegistry::new();
//! let mut services = ServiceCollection::new();
//!
//! services
//!     .affect_singleton::<dyn Catalog, CatalogImpl>(&registry)
//!     .when_calling("list_all", [])
//!     .throw(|_| CatalogError::Unavailable)
//!     .always()?;
//!
//! let provider = services.build();
//! let catalog = provider.resolve::<dyn Catalog>()?; // the proxy
//! ```

use std::sync::Arc;

use application::{AffectedService, AffectedServiceRegistry, Contract, Implements, Injectable};
use domain::{ServiceKey, ServiceLifetime};
use tracing::debug;

use crate::container::{ServiceCollection, ServiceDescriptor};

/// Chaos registration on a [`ServiceCollection`]
pub trait ChaosServiceCollectionExt {
    /// Affect contract `C`, served by implementation `I`
    ///
    /// Creates the registry entry on first use and returns the existing one
    /// afterwards, so repeated calls only ever add rules. The contract's
    /// registration in the collection is replaced in place by one serving
    /// proxies of the returned entry; `I` is registered as itself unless
    /// already present. After a registry reset the next call creates a fresh
    /// entry and rebinds the registration to it.
    fn affect<C, I>(
        &mut self,
        registry: &AffectedServiceRegistry,
        lifetime: ServiceLifetime,
    ) -> Arc<AffectedService<C>>
    where
        C: Contract + ?Sized,
        I: Implements<C> + Injectable;

    /// [`affect`](Self::affect) with a singleton lifetime
    fn affect_singleton<C, I>(&mut self, registry: &AffectedServiceRegistry) -> Arc<AffectedService<C>>
    where
        C: Contract + ?Sized,
        I: Implements<C> + Injectable,
    {
        self.affect::<C, I>(registry, ServiceLifetime::Singleton)
    }

    /// [`affect`](Self::affect) with one instance per scope
    fn affect_scoped<C, I>(&mut self, registry: &AffectedServiceRegistry) -> Arc<AffectedService<C>>
    where
        C: Contract + ?Sized,
        I: Implements<C> + Injectable,
    {
        self.affect::<C, I>(registry, ServiceLifetime::Scoped)
    }

    /// [`affect`](Self::affect) with a new instance per call
    fn affect_transient<C, I>(&mut self, registry: &AffectedServiceRegistry) -> Arc<AffectedService<C>>
    where
        C: Contract + ?Sized,
        I: Implements<C> + Injectable,
    {
        self.affect::<C, I>(registry, ServiceLifetime::Transient)
    }
}

impl ChaosServiceCollectionExt for ServiceCollection {
    fn affect<C, I>(
        &mut self,
        registry: &AffectedServiceRegistry,
        lifetime: ServiceLifetime,
    ) -> Arc<AffectedService<C>>
    where
        C: Contract + ?Sized,
        I: Implements<C> + Injectable,
    {
        let registered = registry.register::<C, I>(lifetime);
        let created = registered.is_new();
        let service = registered.into_inner();
        let contract = ServiceKey::of::<C>();

        // A new entry (first affect, or the first after a reset) must replace
        // any proxy registration bound to an earlier entry.
        let wired = self
            .registrations(contract)
            .any(ServiceDescriptor::is_intercepted);
        if created || !wired {
            let affected = Arc::clone(&service);
            let replaced = self.replace(
                ServiceDescriptor::factory::<C, _>(service.lifetime(), move |context| {
                    Ok(affected.instance(context))
                })
                .with_implementation(service.implementation())
                .intercepted(),
            );
            debug!(
                contract = service.contract_name(),
                replaced = replaced.is_some(),
                "Proxy registration installed"
            );
        }

        // The registry keeps the first implementation it saw.
        if service.implementation().is::<I>() {
            self.try_add(ServiceDescriptor::injectable::<I>(service.lifetime()));
        }

        service
    }
}
