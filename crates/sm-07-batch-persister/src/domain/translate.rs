//! # Record Translation
//!
//! Decoded records become natural-key upserts. The produced batch depends
//! only on its inputs, so applying it twice leaves the store unchanged.
//!
//! A transaction may list the same account (or token/account pair) more than
//! once; those transfers are netted into the one row their key allows.

use serde::Serialize;
use shared_types::{ConsensusTimestamp, EntityId, StreamFileHeader, StreamKind};
use sm_02_bloom_accumulator::LogsBloom;
use sm_03_quorum_verification::SignatureAssertion;
use sm_05_stream_decoder::{DecodedRecord, RecordPayload};
use std::collections::BTreeMap;

use super::entities::{
    AccountBalanceRow, BalanceSnapshotRow, CryptoTransferRow, EventRow, SignatureRow,
    StreamFileRow, TokenBalanceRow, TokenTransferRow, TransactionRow,
};
use super::errors::PersistError;
use super::keys;
use crate::ports::outbound::BatchOperation;

fn put<T: Serialize>(key: Vec<u8>, value: &T) -> Result<BatchOperation, PersistError> {
    Ok(BatchOperation::put(key, bincode::serialize(value)?))
}

/// Sum amounts sharing a key, in key order.
fn net<K: Ord + Copy>(
    ts: ConsensusTimestamp,
    entries: impl IntoIterator<Item = (K, i64)>,
    account_of: impl Fn(K) -> EntityId,
) -> Result<BTreeMap<K, i64>, PersistError> {
    let mut totals = BTreeMap::new();
    for (key, amount) in entries {
        let total: &mut i64 = totals.entry(key).or_insert(0);
        *total = total
            .checked_add(amount)
            .ok_or(PersistError::AmountOverflow {
                timestamp: ts,
                account: account_of(key),
            })?;
    }
    Ok(totals)
}

/// Every row write for one file, excluding the watermark.
pub fn record_operations(
    header: &StreamFileHeader,
    records: &[DecodedRecord],
    bloom: Option<&LogsBloom>,
    assertions: &[SignatureAssertion],
) -> Result<Vec<BatchOperation>, PersistError> {
    let mut ops = Vec::with_capacity(records.len() * 3 + assertions.len() + 2);

    for (index, record) in records.iter().enumerate() {
        let ts = record.consensus_timestamp;
        match (&record.payload, header.kind) {
            (RecordPayload::Transaction(tx), StreamKind::Transaction) => {
                ops.push(put(
                    keys::transaction(ts),
                    &TransactionRow {
                        consensus_timestamp: ts,
                        payer: record.entity_reference,
                        transaction_type: tx.transaction_type,
                        result: tx.result,
                        fee: tx.fee,
                        bloom: tx.bloom.clone(),
                    },
                )?);
                let transfers = net(ts, tx.transfers.iter().map(|t| (t.account, t.amount)), |a| a)?;
                for (account, amount) in transfers {
                    ops.push(put(
                        keys::crypto_transfer(ts, &account),
                        &CryptoTransferRow {
                            consensus_timestamp: ts,
                            account,
                            amount,
                        },
                    )?);
                }
                let token_transfers = net(
                    ts,
                    tx.token_transfers.iter().map(|t| ((t.token, t.account), t.amount)),
                    |(_, account)| account,
                )?;
                for ((token, account), amount) in token_transfers {
                    ops.push(put(
                        keys::token_transfer(ts, &token, &account),
                        &TokenTransferRow {
                            consensus_timestamp: ts,
                            token,
                            account,
                            amount,
                        },
                    )?);
                }
            }
            (RecordPayload::Balance(row), StreamKind::Balance) => {
                let account = record.entity_reference;
                ops.push(put(
                    keys::account_balance(ts, &account),
                    &AccountBalanceRow {
                        consensus_timestamp: ts,
                        account,
                        balance: row.balance,
                    },
                )?);
                for t in &row.token_balances {
                    ops.push(put(
                        keys::token_balance(ts, &account, &t.token),
                        &TokenBalanceRow {
                            consensus_timestamp: ts,
                            account,
                            token: t.token,
                            balance: t.balance,
                        },
                    )?);
                }
            }
            (RecordPayload::Event(event), StreamKind::Event) => {
                ops.push(put(
                    keys::event(ts),
                    &EventRow {
                        consensus_timestamp: ts,
                        creator_node: event.creator_node,
                        sequence: event.sequence,
                        data: event.data.clone(),
                    },
                )?);
            }
            _ => {
                return Err(PersistError::KindMismatch {
                    kind: header.kind,
                    index,
                })
            }
        }
    }

    if header.kind == StreamKind::Balance {
        ops.push(put(
            keys::balance_snapshot(header.period_start),
            &BalanceSnapshotRow {
                consensus_timestamp: header.period_start,
                accounts: records.len() as u64,
            },
        )?);
    }

    for a in assertions {
        ops.push(put(
            keys::signature(header.kind, header.period_start, a.node_id),
            &SignatureRow {
                kind: header.kind,
                period: header.period_start,
                node_id: a.node_id,
                file_hash: a.claimed_hash,
                signature: a.signature.to_vec(),
            },
        )?);
    }

    ops.push(put(
        keys::stream_file(header.kind, header.period_start),
        &StreamFileRow {
            header: header.clone(),
            bloom: bloom.cloned(),
        },
    )?);

    Ok(ops)
}
