//! Drive the sample catalog through the container and tally outcomes

use std::time::{Duration, Instant};

use application::{AffectedServiceRegistry, ResolutionContextExt};
use domain::ServiceLifetime;
use infrastructure::{ChaosConfig, ChaosServiceCollectionExt, ConfiguredRules, ServiceCollection};
use serde::Serialize;
use tracing::debug;

use crate::catalog::{CATALOG_SIZE, Catalog, CatalogError, InMemoryCatalog};

/// Methods exercised by a demo run, in report order
pub const DEMO_METHODS: [&str; 3] = ["list_all", "get_by_id", "search"];

/// Outcomes of the calls made to one method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodReport {
    pub method: &'static str,
    pub calls: u32,
    pub succeeded: u32,
    pub injected: u32,
    pub failed: u32,
    #[serde(serialize_with = "as_millis")]
    pub total_latency: Duration,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn as_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(value.as_millis())
}

impl MethodReport {
    fn new(method: &'static str) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    fn record<T>(&mut self, result: &Result<T, CatalogError>, elapsed: Duration) {
        self.calls += 1;
        self.total_latency += elapsed;
        match result {
            Ok(_) => self.succeeded += 1,
            Err(CatalogError::Injected(_)) => self.injected += 1,
            Err(_) => self.failed += 1,
        }
    }

    /// Mean latency per call, zero when nothing was called
    pub fn mean_latency(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total_latency / self.calls
        }
    }
}

/// Wire the catalog, apply the configured rules and call each method `calls` times
///
/// Calls go through a single scope so every lifetime can be resolved.
pub async fn run(
    config: &ChaosConfig,
    lifetime: ServiceLifetime,
    calls: u32,
) -> anyhow::Result<Vec<MethodReport>> {
    let registry = AffectedServiceRegistry::with_settings(config.settings()?);
    let mut services = ServiceCollection::new();
    let affected = services.affect::<dyn Catalog, InMemoryCatalog>(&registry, lifetime);
    let loaded = affected.load_rules(config)?;
    debug!(rules = loaded, %lifetime, "Demo catalog wired");

    let provider = services.build();
    let scope = provider.create_scope();
    let catalog = scope.resolve::<dyn Catalog>()?;

    let mut reports: Vec<MethodReport> = DEMO_METHODS.into_iter().map(MethodReport::new).collect();
    for n in 0..calls {
        let started = Instant::now();
        let result = catalog.list_all().await;
        reports[0].record(&result, started.elapsed());

        let started = Instant::now();
        let result = catalog.get_by_id(n % CATALOG_SIZE + 1).await;
        reports[1].record(&result, started.elapsed());

        let started = Instant::now();
        let result = catalog.search("item".to_string(), 5).await;
        reports[2].record(&result, started.elapsed());
    }

    Ok(reports)
}
