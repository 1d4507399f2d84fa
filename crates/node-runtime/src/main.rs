//! # stream-mirror
//!
//! Ingests authenticated stream files into durable storage and audits them.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, `SM_CONFIG_FILE`, `SM_*` overrides)
//! 2. Initialize logging and metrics
//! 3. Open storage, load the address book, wire the components
//! 4. Spawn one download loop per enabled stream kind and the reconciliation loop
//! 5. On Ctrl+C: signal shutdown, wait up to the grace period, release leases

use anyhow::{Context, Result};
use futures::future::join_all;
use node_runtime::{MirrorConfig, MirrorRuntime};
use shared_types::shutdown_channel;
use stream_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = MirrorConfig::load().context("loading configuration")?;
    let _telemetry = init_telemetry(&TelemetryConfig::from_env())
        .context("initializing telemetry")?;

    info!("===========================================");
    info!("  stream-mirror v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!("Data Dir: {:?}", config.data_dir);
    info!("Bucket Root: {:?}", config.bucket_root);

    let grace = config.shutdown_grace();
    let runtime = MirrorRuntime::build(config).context("building runtime")?;

    let (trigger, signal) = shutdown_channel();
    let handles = runtime.spawn(&signal);
    info!("{} loop(s) running, press Ctrl+C to stop", handles.len());

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }
    info!("Shutdown requested");
    trigger.trigger();

    match tokio::time::timeout(grace, join_all(handles)).await {
        Ok(results) => {
            for result in results {
                if let Err(e) = result {
                    warn!("Loop ended abnormally: {}", e);
                }
            }
        }
        Err(_) => warn!("Loops still running after {:?}, exiting anyway", grace),
    }

    runtime.gate().release_all();
    info!("Shutdown complete");
    Ok(())
}
