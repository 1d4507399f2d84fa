//! # Reconciliation Engine (SM-08)
//!
//! Audits committed history against two conservation invariants:
//!
//! - **Transfer balance**: between two consecutive balance snapshots, every
//!   account's (and every account-token pair's) balance changes by exactly
//!   the sum of its committed transfers.
//! - **Total supply**: every audited snapshot sums to the fixed network
//!   supply.
//!
//! Each execution covers one window of snapshots and is recorded as a
//! [`ReconciliationRun`]. Findings are observability signals only; they never
//! stop ingestion.
//!
//! ## Scheduling
//!
//! [`ReconciliationEngine::run_once`] is leader-gated: on an instance that
//! does not hold the `reconciliation` lease it returns `Ok(None)` without
//! touching storage. Windows resume from the end of the last recorded run and
//! only cover snapshots whose transfers are fully committed.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::kv_run_store::KvRunStore;
pub use config::{ReconciliationConfig, DEFAULT_TOTAL_SUPPLY};
pub use domain::checks::{check_supply, check_token_transfers, check_transfers, supply_total};
pub use domain::entities::{ReconciliationRun, ReconciliationStatus};
pub use domain::errors::ReconciliationError;
pub use domain::report::{describe, describe_findings};
pub use ports::inbound::ReconciliationApi;
pub use ports::outbound::{InMemoryRunStore, RunStore};
pub use service::{ReconciliationEngine, RECONCILIATION_JOB};
