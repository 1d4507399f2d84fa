//! # Decode Errors

use shared_types::{ConsensusTimestamp, EntityId, FileHash, StreamKind};
use thiserror::Error;

/// Reasons a stream file is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Written by a newer (or unknown) producer. Not corruption.
    #[error("Unsupported stream file version {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Unexpected end of data at offset {offset} (needed {needed} bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("Stream kind tag {tag} does not match declared {expected}")]
    KindMismatch { expected: StreamKind, tag: u8 },

    #[error("Invalid period [{start}, {end})")]
    InvalidPeriod {
        start: ConsensusTimestamp,
        end: ConsensusTimestamp,
    },

    #[error("Item {index} declares {length} bytes, maximum is {max}")]
    ItemTooLarge { index: u32, length: u32, max: u32 },

    #[error("File declares {declared} items but contains {actual}")]
    ItemCountMismatch { declared: u32, actual: u32 },

    #[error("Item {index} is malformed: {reason}")]
    MalformedItem { index: u32, reason: String },

    #[error("Item {index} timestamp {timestamp} is outside the file period")]
    TimestampOutOfPeriod {
        index: u32,
        timestamp: ConsensusTimestamp,
    },

    #[error("Item {index} timestamp {timestamp} breaks record ordering")]
    TimestampOutOfOrder {
        index: u32,
        timestamp: ConsensusTimestamp,
    },

    /// A balance snapshot states one balance per account.
    #[error("Item {index} repeats account {account} in the snapshot")]
    DuplicateAccount { index: u32, account: EntityId },

    #[error("Running hash mismatch: file says {declared:?}, items give {computed:?}")]
    RunningHashMismatch {
        declared: FileHash,
        computed: FileHash,
    },

    #[error("{count} unexpected trailing bytes")]
    TrailingBytes { count: usize },
}

impl DecodeError {
    /// True for the forward-compatibility signal rather than corruption.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DecodeError::UnsupportedVersion { .. })
    }
}
