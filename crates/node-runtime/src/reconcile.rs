//! Reconciliation loop: one `run_once` per interval until shutdown. The
//! engine logs each run's diagnostic; the loop only counts outcomes.

use shared_types::ShutdownSignal;
use sm_08_reconciliation::ReconciliationApi;
use std::sync::Arc;
use std::time::Duration;
use stream_telemetry::RECONCILIATION_RUNS;
use tracing::{debug, error, info, warn};

pub async fn run_reconciliation(
    engine: Arc<dyn ReconciliationApi>,
    interval: Duration,
    shutdown: ShutdownSignal,
) {
    info!("[sm-08] Reconciliation loop started (every {:?})", interval);

    while !shutdown.is_shutdown() {
        let task = engine.clone();
        match tokio::task::spawn_blocking(move || task.run_once()).await {
            Ok(Ok(Some(run))) => {
                RECONCILIATION_RUNS
                    .with_label_values(&[run.status.label()])
                    .inc();
            }
            Ok(Ok(None)) => debug!("[sm-08] No reconciliation window ready"),
            Ok(Err(e)) => warn!("[sm-08] Reconciliation run could not start: {}", e),
            Err(e) => error!("[sm-08] Reconciliation task panicked: {}", e),
        }

        if !shutdown.sleep(interval).await {
            break;
        }
    }

    info!("[sm-08] Reconciliation loop stopped");
}
