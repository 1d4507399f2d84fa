//! # Leader Gate (SM-06)
//!
//! Cluster-wide mutual exclusion for periodic jobs. Each job name maps to a
//! lease in shared storage: `(holder, expires_at)`. An instance holds the job
//! while its lease is unexpired and renews it every time the job runs; a
//! crashed holder stops renewing and the lease lapses after the window.
//!
//! Denial is an expected outcome, not an error:
//!
//! ```ignore
//! if !gate.try_acquire("download-transaction") {
//!     continue;
//! }
//! ```
//!
//! The lease table lives behind the [`LeaseStore`] port so every instance
//! sees the same state. [`InMemoryLeaseStore`] serves tests and single
//! process deployments; the persister crate provides the durable store.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::LeaderConfig;
pub use domain::entities::Lease;
pub use domain::errors::LeaseError;
pub use ports::outbound::{InMemoryLeaseStore, LeaseStore};
pub use service::LeaderGate;
