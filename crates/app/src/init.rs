use anyhow::Result;
use neuromesh_engine::{DomainService, FastRandSource, ServiceKind};
use neuromesh_rpc::Metrics;

/// Build and initialize a service, seeding its default entities
pub fn build_service(kind: ServiceKind, seed: Option<u64>) -> Box<dyn DomainService> {
    let random = match seed {
        Some(seed) => FastRandSource::seeded(seed),
        None => FastRandSource::new(),
    };

    tracing::info!("📦 Initializing {} service...", kind);
    let mut service = kind.instantiate(Box::new(random));
    service.initialize();

    for (store, count) in service.info().entity_counts {
        tracing::info!("  ✓ {}: {}", store, count);
    }
    tracing::info!("✅ {} service initialized", kind);

    service
}

/// Build the metrics collector unless disabled
pub fn build_metrics(enabled: bool) -> Result<Option<Metrics>> {
    if !enabled {
        return Ok(None);
    }
    let metrics = Metrics::new()
        .map_err(|e| anyhow::anyhow!("Failed to create metrics: {}", e))?;
    Ok(Some(metrics))
}
