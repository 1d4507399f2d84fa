//! # Reconciliation Errors
//!
//! Failures that prevent a run from being recorded at all. Failures during
//! an audit are recorded on the run as `UnknownError` instead.

use sm_07_batch_persister::PersistError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconciliationError {
    #[error("Ledger read failed: {0}")]
    Ledger(#[from] PersistError),

    #[error("Run storage failed: {0}")]
    RunStorage(String),

    #[error("Invalid reconciliation config: {0}")]
    InvalidConfig(String),
}
