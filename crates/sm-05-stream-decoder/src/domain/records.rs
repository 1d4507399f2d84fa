//! # Decoded Records
//!
//! One [`DecodedRecord`] per item of a stream file. Records are transient:
//! the persister translates them into storage entities.

use serde::{Deserialize, Serialize};
use shared_types::{ConsensusTimestamp, EntityId};
use sm_02_bloom_accumulator::LogsBloom;

/// A unit of decoded ledger history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedRecord {
    pub consensus_timestamp: ConsensusTimestamp,
    /// Payer for transactions, account for balance rows, creator node
    /// account for events.
    pub entity_reference: EntityId,
    pub payload: RecordPayload,
}

/// Kind-specific record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordPayload {
    Transaction(TransactionPayload),
    Balance(BalancePayload),
    Event(EventPayload),
}

/// Net hbar movement of one account within a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub account: EntityId,
    pub amount: i64,
}

/// Net token movement of one account within a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub token: EntityId,
    pub account: EntityId,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub transaction_type: u16,
    pub result: u16,
    pub fee: u64,
    pub transfers: Vec<Transfer>,
    /// Always empty in version 1 files.
    pub token_transfers: Vec<TokenTransfer>,
    /// Contract log bloom, when the transaction produced one.
    pub bloom: Option<LogsBloom>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token: EntityId,
    pub balance: i64,
}

/// One account row of a balance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePayload {
    pub balance: i64,
    pub token_balances: Vec<TokenBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub creator_node: u64,
    pub sequence: u64,
    pub data: Vec<u8>,
}

impl DecodedRecord {
    pub fn transaction(
        consensus_timestamp: ConsensusTimestamp,
        payer: EntityId,
        payload: TransactionPayload,
    ) -> Self {
        Self {
            consensus_timestamp,
            entity_reference: payer,
            payload: RecordPayload::Transaction(payload),
        }
    }

    pub fn balance(
        consensus_timestamp: ConsensusTimestamp,
        account: EntityId,
        balance: i64,
        token_balances: Vec<TokenBalance>,
    ) -> Self {
        Self {
            consensus_timestamp,
            entity_reference: account,
            payload: RecordPayload::Balance(BalancePayload {
                balance,
                token_balances,
            }),
        }
    }

    pub fn event(
        consensus_timestamp: ConsensusTimestamp,
        creator_node: u64,
        sequence: u64,
        data: Vec<u8>,
    ) -> Self {
        Self {
            consensus_timestamp,
            entity_reference: EntityId::of(creator_node),
            payload: RecordPayload::Event(EventPayload {
                creator_node,
                sequence,
                data,
            }),
        }
    }

    /// Bloom carried by the record, if any.
    pub fn bloom(&self) -> Option<&LogsBloom> {
        match &self.payload {
            RecordPayload::Transaction(tx) => tx.bloom.as_ref(),
            _ => None,
        }
    }
}
