//! Test fixtures: a sample contract and an in-memory resolution context

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use domain::{ContractDescriptor, Invocation, MethodSpec, ServiceKey};
use mockall::automock;
use parking_lot::RwLock;
use thiserror::Error;

use crate::error::{InjectedFault, ResolutionError};
use crate::interceptor::Interceptor;
use crate::ports::{Contract, Implements, Instance, ResolutionContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: u32,
    pub name: String,
}

impl Item {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: format!("item-{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Error)]
pub enum CatalogError {
    #[default]
    #[error("catalog unavailable")]
    Unavailable,
    #[error("item {0} not found")]
    NotFound(u32),
    #[error(transparent)]
    Injected(#[from] InjectedFault),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

#[automock]
pub trait Catalog: Send + Sync {
    fn list_all(&self) -> Result<Vec<Item>, CatalogError>;
    fn get_by_id(&self, id: u32) -> Result<Item, CatalogError>;
    fn search(&self, query: String, limit: u32) -> Result<Vec<Item>, CatalogError>;
}

struct AffectedCatalog(Interceptor<dyn Catalog>);

impl Catalog for AffectedCatalog {
    fn list_all(&self) -> Result<Vec<Item>, CatalogError> {
        self.0
            .intercept(&Invocation::without_args("list_all"))
            .run(|catalog| catalog.list_all())
    }

    fn get_by_id(&self, id: u32) -> Result<Item, CatalogError> {
        self.0
            .intercept(&Invocation::new("get_by_id", &[&id]))
            .run(|catalog| catalog.get_by_id(id))
    }

    fn search(&self, query: String, limit: u32) -> Result<Vec<Item>, CatalogError> {
        let interception = self.0.intercept(&Invocation::new("search", &[&query, &limit]));
        interception.run(|catalog| catalog.search(query, limit))
    }
}

impl Contract for dyn Catalog {
    type Error = CatalogError;

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::new("Catalog")
            .method(MethodSpec::new("list_all"))
            .method(MethodSpec::new("get_by_id").param::<u32>())
            .method(MethodSpec::new("search").param::<String>().param::<u32>())
    }

    fn proxy(interceptor: Interceptor<Self>) -> Arc<Self> {
        Arc::new(AffectedCatalog(interceptor))
    }
}

impl Implements<dyn Catalog> for MockCatalog {
    fn into_contract(self: Arc<Self>) -> Arc<dyn Catalog> {
        self
    }
}

/// Real implementation counting how often it is reached
#[derive(Debug, Default)]
pub struct CountingCatalog {
    pub calls: AtomicUsize,
}

impl Catalog for CountingCatalog {
    fn list_all(&self) -> Result<Vec<Item>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Item::new(1), Item::new(2)])
    }

    fn get_by_id(&self, id: u32) -> Result<Item, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Item::new(id))
    }

    fn search(&self, _query: String, limit: u32) -> Result<Vec<Item>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..limit).map(Item::new).collect())
    }
}

impl Implements<dyn Catalog> for CountingCatalog {
    fn into_contract(self: Arc<Self>) -> Arc<dyn Catalog> {
        self
    }
}

/// Resolution context over a fixed set of instances
#[derive(Clone, Default)]
pub struct StubContext {
    instances: Arc<RwLock<HashMap<ServiceKey, Instance>>>,
    resolutions: Arc<AtomicUsize>,
}

impl StubContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: ?Sized + Send + Sync + 'static>(self, instance: Arc<T>) -> Self {
        self.with_raw(ServiceKey::of::<T>(), Arc::new(instance))
    }

    pub fn with_raw(self, key: ServiceKey, instance: Instance) -> Self {
        self.instances.write().insert(key, instance);
        self
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl ResolutionContext for StubContext {
    fn resolve_instance(&self, service: ServiceKey) -> Result<Instance, ResolutionError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.instances
            .read()
            .get(&service)
            .cloned()
            .ok_or_else(|| ResolutionError::not_registered(service.short_name()))
    }

    fn handle(&self) -> Arc<dyn ResolutionContext> {
        Arc::new(self.clone())
    }
}
