//! Integration tests for lifetimes seen through chaos proxies
//!
//! The proxy resolves the real implementation on every forwarded call, so
//! each lifetime must behave exactly as it would without interception.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use application::{ResolutionContextExt, ResolutionError};
use common::{Catalog, CatalogError, Fixture};
use domain::ServiceLifetime;

#[tokio::test]
async fn singleton_is_shared_across_scopes() {
    let fixture = Fixture::new(ServiceLifetime::Singleton);
    let provider = fixture.build();
    let first = provider.create_scope();
    let second = provider.create_scope();

    let a = first.resolve::<dyn Catalog>().unwrap();
    let b = second.resolve::<dyn Catalog>().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.instance_id().await, b.instance_id().await);
    assert_eq!(fixture.log.created(), 1);
}

#[tokio::test]
async fn scoped_is_one_instance_per_scope() {
    let fixture = Fixture::new(ServiceLifetime::Scoped);
    let provider = fixture.build();
    let first = provider.create_scope();
    let second = provider.create_scope();

    let a = first.resolve::<dyn Catalog>().unwrap();
    let a_again = first.resolve::<dyn Catalog>().unwrap();
    let b = second.resolve::<dyn Catalog>().unwrap();

    assert!(Arc::ptr_eq(&a, &a_again));
    assert_eq!(a.instance_id().await, a.instance_id().await);
    assert_ne!(a.instance_id().await, b.instance_id().await);
    assert_eq!(fixture.log.created(), 2);
}

#[tokio::test]
async fn scoped_proxy_from_root_is_rejected() {
    let fixture = Fixture::new(ServiceLifetime::Scoped);
    let provider = fixture.build();

    let err = provider.resolve::<dyn Catalog>().err().unwrap();
    assert!(matches!(err, ResolutionError::ScopedFromRoot { .. }));
}

#[tokio::test]
async fn transient_is_fresh_for_every_call() {
    let fixture = Fixture::new(ServiceLifetime::Transient);
    let provider = fixture.build();
    let catalog = provider.resolve::<dyn Catalog>().unwrap();

    let first = catalog.instance_id().await.unwrap();
    let second = catalog.instance_id().await.unwrap();

    assert_ne!(first, second);
    assert_eq!(fixture.log.created(), 2);
}

#[tokio::test]
async fn call_after_scope_is_dropped_fails() {
    let fixture = Fixture::new(ServiceLifetime::Scoped);
    let provider = fixture.build();
    let scope = provider.create_scope();
    let catalog = scope.resolve::<dyn Catalog>().unwrap();
    assert!(catalog.list_all().await.is_ok());

    drop(scope);

    assert_eq!(
        catalog.list_all().await,
        Err(CatalogError::Resolution(ResolutionError::ScopeDisposed))
    );
}

#[tokio::test]
async fn injected_error_does_not_need_a_live_scope() {
    let fixture = Fixture::new(ServiceLifetime::Scoped);
    fixture
        .affected
        .when_calling("list_all", [])
        .throw(|_| CatalogError::RuntimeFailure)
        .always()
        .unwrap();
    let provider = fixture.build();
    let scope = provider.create_scope();
    let catalog = scope.resolve::<dyn Catalog>().unwrap();
    drop(scope);

    assert_eq!(catalog.list_all().await, Err(CatalogError::RuntimeFailure));
    assert_eq!(fixture.log.created(), 0);
}

#[tokio::test]
async fn missing_dependency_surfaces_as_contract_error() {
    let registry = application::AffectedServiceRegistry::new();
    let mut services = infrastructure::ServiceCollection::new();
    infrastructure::ChaosServiceCollectionExt::affect_singleton::<dyn Catalog, common::CatalogImpl>(
        &mut services,
        &registry,
    );
    let provider = services.build();
    let catalog = provider.resolve::<dyn Catalog>().unwrap();

    assert!(matches!(
        catalog.list_all().await,
        Err(CatalogError::Resolution(ResolutionError::NotRegistered { .. }))
    ));
}
