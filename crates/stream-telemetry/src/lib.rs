//! # Stream Telemetry
//!
//! Logging and metrics for stream-mirror.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stream_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SM_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `SM_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `SM_SERVICE_NAME` | `stream-mirror` | Service name attached to startup logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_metrics, register_metrics, DECODE_FAILURES, FILES_COMMITTED, LAST_COMMITTED_PERIOD,
    QUORUM_OUTCOMES, RECONCILIATION_RUNS, RECORDS_COMMITTED, SOURCE_FAILURES,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install the log subscriber and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(config)?;
    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "Telemetry initialized"
    );
    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Held for the lifetime of the process.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
