//! Sample `Catalog` contract the CLI exercises rules against

use std::sync::Arc;
use std::time::Duration;

use application::{
    Contract, Implements, InjectedFault, Injectable, Interceptor, ResolutionContext,
    ResolutionError,
};
use async_trait::async_trait;
use domain::{ContractDescriptor, Invocation, MethodSpec};
use serde::Serialize;
use thiserror::Error;

/// Simulated work done by every real call
const BACKEND_LATENCY: Duration = Duration::from_millis(2);

/// Largest id the sample catalog knows
pub const CATALOG_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: u32,
    pub name: String,
}

impl Item {
    fn new(id: u32) -> Self {
        Self {
            id,
            name: format!("item-{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Item {0} not found")]
    NotFound(u32),

    #[error(transparent)]
    Injected(#[from] InjectedFault),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Item>, CatalogError>;
    async fn get_by_id(&self, id: u32) -> Result<Item, CatalogError>;
    async fn search(&self, query: String, limit: u32) -> Result<Vec<Item>, CatalogError>;
}

struct AffectedCatalog(Interceptor<dyn Catalog>);

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

/// In-memory catalog of `CATALOG_SIZE` items
#[derive(Debug, Default)]
pub struct InMemoryCatalog;

impl Injectable for InMemoryCatalog {
    fn create(_: &dyn ResolutionContext) -> Result<Self, ResolutionError> {
        Ok(Self)
    }
}

impl Implements<dyn Catalog> for InMemoryCatalog {
    fn into_contract(self: Arc<Self>) -> Arc<dyn Catalog> {
        self
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn list_all(&self) -> Result<Vec<Item>, CatalogError> {
        tokio::time::sleep(BACKEND_LATENCY).await;
        Ok((1..=CATALOG_SIZE).map(Item::new).collect())
    }

    async fn get_by_id(&self, id: u32) -> Result<Item, CatalogError> {
        tokio::time::sleep(BACKEND_LATENCY).await;
        if (1..=CATALOG_SIZE).contains(&id) {
            Ok(Item::new(id))
        } else {
            Err(CatalogError::NotFound(id))
        }
    }

    async fn search(&self, query: String, limit: u32) -> Result<Vec<Item>, CatalogError> {
        tokio::time::sleep(BACKEND_LATENCY).await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok((1..=CATALOG_SIZE)
            .map(Item::new)
            .filter(|item| item.name.contains(&query))
            .take(limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_by_id_outside_range_is_not_found() {
        let catalog = InMemoryCatalog;
        assert_eq!(catalog.get_by_id(7).await.unwrap().name, "item-7");
        assert_eq!(catalog.get_by_id(0).await, Err(CatalogError::NotFound(0)));
    }

    #[tokio::test]
    async fn search_honors_limit() {
        let catalog = InMemoryCatalog;
        let found = catalog.search("item-1".to_string(), 3).await.unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|item| item.name.contains("item-1")));
    }

    #[test]
    fn descriptor_lists_methods() {
        let descriptor = <dyn Catalog as Contract>::descriptor();
        assert_eq!(descriptor.name(), "Catalog");
        assert_eq!(descriptor.overloads("search", 2).count(), 1);
        assert_eq!(descriptor.overloads("get_by_id", 2).count(), 0);
    }
}
