//! # Storage Entities
//!
//! The persisted model. Each row type has a natural key (see `keys`).

use serde::{Deserialize, Serialize};
use shared_types::{ConsensusTimestamp, EntityId, FileHash, NodeId, StreamFileHeader, StreamKind};
use sm_02_bloom_accumulator::LogsBloom;

/// Keyed by consensus timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub consensus_timestamp: ConsensusTimestamp,
    pub payer: EntityId,
    pub transaction_type: u16,
    pub result: u16,
    pub fee: u64,
    pub bloom: Option<LogsBloom>,
}

/// Keyed by (timestamp, account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoTransferRow {
    pub consensus_timestamp: ConsensusTimestamp,
    pub account: EntityId,
    pub amount: i64,
}

/// Keyed by (timestamp, token, account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransferRow {
    pub consensus_timestamp: ConsensusTimestamp,
    pub token: EntityId,
    pub account: EntityId,
    pub amount: i64,
}

/// Keyed by (snapshot timestamp, account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceRow {
    pub consensus_timestamp: ConsensusTimestamp,
    pub account: EntityId,
    pub balance: i64,
}

/// Keyed by (snapshot timestamp, account, token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalanceRow {
    pub consensus_timestamp: ConsensusTimestamp,
    pub account: EntityId,
    pub token: EntityId,
    pub balance: i64,
}

/// Keyed by snapshot timestamp; one per committed balance file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshotRow {
    pub consensus_timestamp: ConsensusTimestamp,
    pub accounts: u64,
}

/// Keyed by consensus timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    pub consensus_timestamp: ConsensusTimestamp,
    pub creator_node: NodeId,
    pub sequence: u64,
    pub data: Vec<u8>,
}

/// Keyed by (kind, period start).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFileRow {
    pub header: StreamFileHeader,
    /// OR of the file's record blooms, when any record had one.
    pub bloom: Option<LogsBloom>,
}

/// Audit trail of an accepted quorum. Keyed by (kind, period, node).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRow {
    pub kind: StreamKind,
    pub period: ConsensusTimestamp,
    pub node_id: NodeId,
    pub file_hash: FileHash,
    pub signature: Vec<u8>,
}

/// Result of a successful commit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The file was written and the watermark advanced.
    Committed { records: usize },
    /// The file was already the committed head (or earlier in the chain).
    AlreadyApplied,
}
