//! Error types for bloom parsing

use thiserror::Error;

/// Errors raised while building a bloom from raw bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BloomError {
    #[error("Invalid bloom length: {actual} bytes (expected {expected})")]
    InvalidLength { expected: usize, actual: usize },
}
