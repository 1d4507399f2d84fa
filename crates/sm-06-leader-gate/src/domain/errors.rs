//! # Lease Errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LeaseError {
    /// The backing lease table could not be read or written.
    #[error("Lease storage error: {0}")]
    Storage(String),
}
