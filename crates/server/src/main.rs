//! vmcost-server: cost API for on-premises virtualization infrastructure

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vmcost_lib::{
    health::{components, HealthRegistry},
    CostMetrics, Inventory, StructuredLogger,
};
use vmcost_server::{api, config::ServerConfig};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting vmcost-server");

    let config = ServerConfig::load().context("Failed to load server configuration")?;
    info!(instance = %config.instance_name, currency = %config.currency, "Server configured");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::INVENTORY).await;
    health_registry.register(components::COST_MODEL).await;
    health_registry.register(components::SESSION).await;

    let metrics = CostMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    let (inventory, source) = match &config.inventory_path {
        Some(path) => {
            let inventory = Inventory::from_json_file(path)
                .with_context(|| format!("Failed to load inventory from {}", path))?;
            (inventory, path.clone())
        }
        None => (Inventory::sample(), "sample".to_string()),
    };
    logger.log_inventory_loaded(
        &source,
        inventory.vms.len(),
        inventory.hosts.len(),
        inventory.datastores.len(),
    );
    if inventory.vms.is_empty() {
        warn!("Inventory has no VMs; per-VM rates will not be finite");
    }
    health_registry.record_inventory(&inventory).await;
    metrics.set_inventory_vms(inventory.vms.len());

    let app_state = Arc::new(api::AppState::new(
        inventory,
        config.currency.clone(),
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(SERVER_VERSION, config.api_port);

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            result.context("API server task panicked")??;
        }
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
