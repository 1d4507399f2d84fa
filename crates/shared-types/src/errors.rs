//! # Error Types
//!
//! Parse errors for the textual forms of the shared primitives.

use thiserror::Error;

/// Errors raised while parsing shared primitives from text or raw bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A digest had the wrong number of bytes.
    #[error("Invalid hash length: expected {expected} bytes, got {actual}")]
    InvalidHashLength { expected: usize, actual: usize },

    /// Hex decoding failed.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// The stream kind name is not one of the closed set.
    #[error("Unknown stream kind: {0}")]
    UnknownStreamKind(String),

    /// An entity id was not of the form `shard.realm.num`.
    #[error("Invalid entity id: {0}")]
    InvalidEntityId(String),
}
