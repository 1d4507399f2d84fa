//! Prometheus metrics.
//!
//! Naming convention: `sm_<component>_<metric>_<unit>`.

use lazy_static::lazy_static;
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // INGESTION
    // =========================================================================

    pub static ref FILES_COMMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("sm_persister_files_committed_total", "Stream files committed"),
        &["kind"]
    ).expect("metric creation failed");

    pub static ref RECORDS_COMMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("sm_persister_records_committed_total", "Decoded records committed"),
        &["kind"]
    ).expect("metric creation failed");

    /// Start of the last committed period, in nanoseconds
    pub static ref LAST_COMMITTED_PERIOD: GaugeVec = GaugeVec::new(
        Opts::new("sm_persister_last_committed_period", "Watermark period start (ns)"),
        &["kind"]
    ).expect("metric creation failed");

    pub static ref QUORUM_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("sm_quorum_rounds_total", "Quorum rounds by outcome"),
        &["kind", "outcome"]  // outcome: accepted/insufficient/conflict
    ).expect("metric creation failed");

    pub static ref SOURCE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("sm_fetcher_source_failures_total", "Sources excluded from a round"),
        &["kind"]
    ).expect("metric creation failed");

    pub static ref DECODE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("sm_decoder_failures_total", "Authenticated files rejected by the decoder"),
        &["kind", "reason"]  // reason: unsupported/structural
    ).expect("metric creation failed");

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    pub static ref RECONCILIATION_RUNS: IntCounterVec = IntCounterVec::new(
        Opts::new("sm_reconciliation_runs_total", "Reconciliation runs by terminal status"),
        &["status"]
    ).expect("metric creation failed");
}

/// Register every metric with [`REGISTRY`]. Registering twice fails.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(FILES_COMMITTED.clone()),
        Box::new(RECORDS_COMMITTED.clone()),
        Box::new(LAST_COMMITTED_PERIOD.clone()),
        Box::new(QUORUM_OUTCOMES.clone()),
        Box::new(SOURCE_FAILURES.clone()),
        Box::new(DECODE_FAILURES.clone()),
        Box::new(RECONCILIATION_RUNS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
