//! # Persistence Errors

use shared_types::{ConsensusTimestamp, EntityId, FileHash, StreamKind};
use thiserror::Error;

/// Key-value backend failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },

    /// A conditional write found a key in an unexpected state.
    #[error("Precondition failed on key {key}")]
    ConditionFailed { key: String },
}

/// Commit failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistError {
    /// The file does not extend the last committed file.
    #[error(
        "Chain broken for {kind} file at {period}: previous hash {actual_previous:?}, \
         last committed {expected_previous:?}"
    )]
    ChainBroken {
        kind: StreamKind,
        period: ConsensusTimestamp,
        expected_previous: FileHash,
        actual_previous: FileHash,
    },

    /// The first file of a stream does not chain to the configured start.
    #[error("First {kind} file chains to {actual:?}, expected start hash {expected:?}")]
    StartHashMismatch {
        kind: StreamKind,
        expected: FileHash,
        actual: FileHash,
    },

    /// A different file was already committed at or after this period.
    #[error("{kind} file at {period} is not after watermark {watermark}")]
    PeriodRegression {
        kind: StreamKind,
        period: ConsensusTimestamp,
        watermark: ConsensusTimestamp,
    },

    /// Another writer moved the watermark between read and write.
    #[error("Concurrent commit detected for {kind} file at {period}")]
    ConcurrentCommit {
        kind: StreamKind,
        period: ConsensusTimestamp,
    },

    /// A record's payload does not belong to the file's stream kind.
    #[error("Record {index} does not belong to a {kind} file")]
    KindMismatch { kind: StreamKind, index: usize },

    /// Netting one transaction's transfers to a single key overflowed.
    #[error("Transfers to {account} at {timestamp} overflow when netted")]
    AmountOverflow {
        timestamp: ConsensusTimestamp,
        account: EntityId,
    },

    #[error(transparent)]
    Storage(#[from] KVStoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PersistError {
    /// Retrying from fetch may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PersistError::ChainBroken { .. }
                | PersistError::ConcurrentCommit { .. }
                | PersistError::Storage(_)
        )
    }
}

impl From<bincode::Error> for PersistError {
    fn from(e: bincode::Error) -> Self {
        PersistError::Serialization(e.to_string())
    }
}
