pub mod console;
pub mod once;
pub mod serve;

use anyhow::Context;
use awtrix_sync_core::apps::DirectoryRegistry;
use awtrix_sync_core::config::Config;
use awtrix_sync_core::known::KnownUnitsStore;
use awtrix_sync_core::pending::PendingBuffer;
use awtrix_sync_core::producer::{CompositeRegistry, ProducerRegistry, StaticRegistry};
use awtrix_sync_core::productive::ProductiveProducer;
use awtrix_sync_core::{AwtrixClient, ReconciliationEngine};
use std::sync::Arc;
use std::time::Duration;

/// Wire the engine to the apps directory, the optional report producer and
/// the device.
pub fn build_engine(config: &Config) -> anyhow::Result<ReconciliationEngine> {
    let mut children: Vec<Arc<dyn ProducerRegistry>> =
        vec![Arc::new(DirectoryRegistry::new(&config.apps_dir))];

    if let Some(productive) = config.productive_enabled() {
        let producer = ProductiveProducer::new(
            productive.clone(),
            Duration::from_secs(config.producer_timeout_secs),
        )
        .context("failed to set up the productive report producer")?;
        let registry = StaticRegistry::new();
        registry.register(Arc::new(producer));
        children.push(Arc::new(registry));
        tracing::info!(unit = %productive.unit_name, "productive report widget enabled");
    }

    let client = AwtrixClient::new(&config.device.address, config.device_timeout())
        .context("failed to create display client")?;
    tracing::info!(endpoint = %client.endpoint(), "display configured");

    Ok(ReconciliationEngine::new(
        Arc::new(CompositeRegistry::new(children)),
        Arc::new(client),
        PendingBuffer::new(config.pending_path()),
        KnownUnitsStore::new(config.known_units_path()),
        config.engine_options(),
    ))
}
