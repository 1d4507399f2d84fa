//! # Quorum Errors
//!
//! Quorum outcomes other than acceptance. `InsufficientQuorum` is retryable
//! with fresh data; `Conflict` is a fatal integrity condition.

use shared_types::{ConsensusTimestamp, FileHash, StreamKind};
use thiserror::Error;

/// Errors that can occur while deciding a quorum.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuorumError {
    /// No assertions were supplied.
    #[error("No signature assertions for {kind} file at {period}")]
    NoAssertions {
        kind: StreamKind,
        period: ConsensusTimestamp,
    },

    /// Assertions for different files were mixed in one batch.
    #[error("Assertions span more than one file (expected {kind} at {period})")]
    MixedBatch {
        kind: StreamKind,
        period: ConsensusTimestamp,
    },

    /// No hash gathered enough stake.
    #[error(
        "Insufficient quorum for {kind} file at {period}: best stake {best_stake} of {total_stake}"
    )]
    InsufficientQuorum {
        kind: StreamKind,
        period: ConsensusTimestamp,
        best_stake: u128,
        total_stake: u128,
    },

    /// More than one hash cleared the threshold: the network has split.
    #[error("Quorum conflict for {kind} file at {period}: {} hashes cleared the threshold", .hashes.len())]
    Conflict {
        kind: StreamKind,
        period: ConsensusTimestamp,
        hashes: Vec<(FileHash, u128)>,
    },

    /// The configured stake fraction is unusable.
    #[error("Invalid quorum policy: {0}")]
    InvalidPolicy(String),
}

impl QuorumError {
    /// Fatal errors halt the stream kind pending operator intervention.
    pub fn is_fatal(&self) -> bool {
        matches!(self, QuorumError::Conflict { .. })
    }
}
