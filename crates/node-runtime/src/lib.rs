//! # Node Runtime Library
//!
//! Wiring and periodic jobs of the `stream-mirror` binary, exposed for
//! integration tests.
//!
//! ## Jobs
//!
//! - **download:<kind>**: fetch → verify → download → decode → commit, one
//!   file at a time per stream kind. A quorum conflict halts that kind only.
//! - **reconciliation**: audits committed history on a schedule.
//!
//! Both are leader-gated: every instance runs the loops, only the lease
//! holder does the work.

pub mod adapters;
pub mod config;
pub mod pipeline;
pub mod reconcile;
pub mod runtime;

pub use config::{ConfigError, MirrorConfig, StorageBackend};
pub use pipeline::{download_job, CycleOutcome, DownloadPipeline, PipelineError};
pub use reconcile::run_reconciliation;
pub use runtime::MirrorRuntime;
