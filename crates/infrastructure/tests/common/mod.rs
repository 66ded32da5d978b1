//! Shared fixtures: an async `Catalog` contract wired through the container

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use application::{
    AffectedService, AffectedServiceRegistry, Contract, Implements, InjectedFault, Injectable,
    Interceptor, ResolutionContext, ResolutionContextExt, ResolutionError,
};
use async_trait::async_trait;
use domain::{ContractDescriptor, Invocation, MethodSpec, ServiceLifetime};
use infrastructure::{ChaosServiceCollectionExt, ServiceCollection, ServiceProvider};
use mockall::automock;

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

#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
pub enum CatalogError {
    #[default]
    #[error("catalog unavailable")]
    Unavailable,
    #[error("runtime failure")]
    RuntimeFailure,
    #[error(transparent)]
    Injected(#[from] InjectedFault),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

#[automock]
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Item>, CatalogError>;
    async fn get_by_id(&self, id: u32) -> Result<Item, CatalogError>;
    async fn search(&self, query: String, limit: u32) -> Result<Vec<Item>, CatalogError>;
    /// Identity of the real instance behind the contract
    async fn instance_id(&self) -> Result<usize, CatalogError>;
}

pub struct AffectedCatalog(Interceptor<dyn Catalog>);

#[async_trait]
impl Catalog for AffectedCatalog {
    async fn list_all(&self) -> Result<Vec<Item>, CatalogError> {
        let call = self
            .0
            .intercept(&Invocation::without_args("list_all"))
            .run_async(|catalog| async move { catalog.list_all().await });
        call.await
    }

    async fn get_by_id(&self, id: u32) -> Result<Item, CatalogError> {
        let call = self
            .0
            .intercept(&Invocation::new("get_by_id", &[&id]))
            .run_async(move |catalog| async move { catalog.get_by_id(id).await });
        call.await
    }

    async fn search(&self, query: String, limit: u32) -> Result<Vec<Item>, CatalogError> {
        let call = self
            .0
            .intercept(&Invocation::new("search", &[&query, &limit]))
            .run_async(move |catalog| async move { catalog.search(query, limit).await });
        call.await
    }

    async fn instance_id(&self) -> Result<usize, CatalogError> {
        let call = self
            .0
            .intercept(&Invocation::without_args("instance_id"))
            .run_async(|catalog| async move { catalog.instance_id().await });
        call.await
    }
}

impl Contract for dyn Catalog {
    type Error = CatalogError;

    fn descriptor() -> ContractDescriptor {
        ContractDescriptor::new("Catalog")
            .method(MethodSpec::new("list_all"))
            .method(MethodSpec::new("get_by_id").param::<u32>())
            .method(MethodSpec::new("search").param::<String>().param::<u32>())
            .method(MethodSpec::new("instance_id"))
    }

    fn proxy(interceptor: Interceptor<Self>) -> Arc<Self> {
        Arc::new(AffectedCatalog(interceptor))
    }
}

/// Side-effect log shared by every `CatalogImpl`
#[derive(Debug, Default)]
pub struct CallLog {
    pub created: AtomicUsize,
    pub calls: AtomicUsize,
}

impl CallLog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

/// The real catalog
#[derive(Debug)]
pub struct CatalogImpl {
    id: usize,
    log: Arc<CallLog>,
}

impl Injectable for CatalogImpl {
    fn create(context: &dyn ResolutionContext) -> Result<Self, ResolutionError> {
        let log = context.resolve::<CallLog>()?;
        let id = log.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Self { id, log })
    }
}

#[async_trait]
impl Catalog for CatalogImpl {
    async fn list_all(&self) -> Result<Vec<Item>, CatalogError> {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Item::new(1), Item::new(2)])
    }

    async fn get_by_id(&self, id: u32) -> Result<Item, CatalogError> {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Item::new(id))
    }

    async fn search(&self, _query: String, limit: u32) -> Result<Vec<Item>, CatalogError> {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..limit).map(Item::new).collect())
    }

    async fn instance_id(&self) -> Result<usize, CatalogError> {
        Ok(self.id)
    }
}

impl Implements<dyn Catalog> for CatalogImpl {
    fn into_contract(self: Arc<Self>) -> Arc<dyn Catalog> {
        self
    }
}

impl Injectable for MockCatalog {
    fn create(_: &dyn ResolutionContext) -> Result<Self, ResolutionError> {
        Err(ResolutionError::factory(
            "MockCatalog",
            "mocks are registered as instances",
        ))
    }
}

impl Implements<dyn Catalog> for MockCatalog {
    fn into_contract(self: Arc<Self>) -> Arc<dyn Catalog> {
        self
    }
}

/// Container with the real catalog affected under `lifetime`
pub struct Fixture {
    pub registry: AffectedServiceRegistry,
    pub services: ServiceCollection,
    pub log: Arc<CallLog>,
    pub affected: Arc<AffectedService<dyn Catalog>>,
}

impl Fixture {
    pub fn new(lifetime: ServiceLifetime) -> Self {
        let registry = AffectedServiceRegistry::new();
        let log = Arc::new(CallLog::default());
        let mut services = ServiceCollection::new();
        services.add_instance(Arc::clone(&log));
        let affected = services.affect::<dyn Catalog, CatalogImpl>(&registry, lifetime);
        Self {
            registry,
            services,
            log,
            affected,
        }
    }

    pub fn build(&self) -> ServiceProvider {
        self.services.build()
    }
}
