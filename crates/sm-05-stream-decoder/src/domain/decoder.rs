//! # File Decoder
//!
//! Sequential, single-pass decode of one stream file. The per-file bloom
//! accumulator and running hash are owned by the pass.

use shared_types::{ConsensusTimestamp, FileHash, StreamFileHeader, StreamKind, HASH_LENGTH};
use sm_02_bloom_accumulator::{BloomAccumulator, LogsBloom};

use super::errors::DecodeError;
use super::reader::Reader;
use super::records::{
    DecodedRecord, TokenBalance, TokenTransfer, TransactionPayload, Transfer,
};
use super::{SUPPORTED_VERSIONS, VERSION_2};
use crate::config::DecoderConfig;
use std::collections::HashSet;

/// Fixed header size: version, kind tag, period bounds, previous hash, count.
pub const HEADER_LENGTH: usize = 4 + 1 + 8 + 8 + HASH_LENGTH + 4;

/// A fully validated stream file.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub header: StreamFileHeader,
    pub records: Vec<DecodedRecord>,
    /// OR of every record bloom in the file.
    pub bloom: BloomAccumulator,
}

/// Decode `bytes` as a file of the declared `kind`.
pub fn decode_file(
    kind: StreamKind,
    bytes: &[u8],
    config: &DecoderConfig,
) -> Result<DecodedFile, DecodeError> {
    let mut r = Reader::new(bytes);

    let version = r.u32()?;
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(DecodeError::UnsupportedVersion { version });
    }
    let tag = r.u8()?;
    if StreamKind::from_tag(tag) != Some(kind) {
        return Err(DecodeError::KindMismatch {
            expected: kind,
            tag,
        });
    }
    let period_start = r.u64()?;
    let period_end = r.u64()?;
    if period_end <= period_start {
        return Err(DecodeError::InvalidPeriod {
            start: period_start,
            end: period_end,
        });
    }
    let previous_hash = r.hash()?;
    let item_count = r.u32()?;

    // Each item needs at least its length prefix.
    let capacity = (item_count as usize).min(r.remaining() / 4);
    let mut records = Vec::with_capacity(capacity);
    let mut running = previous_hash;
    let mut bloom = BloomAccumulator::new();
    let mut last_ts: Option<ConsensusTimestamp> = None;
    let mut accounts = HashSet::new();

    for index in 0..item_count {
        if r.remaining() == HASH_LENGTH {
            return Err(DecodeError::ItemCountMismatch {
                declared: item_count,
                actual: index,
            });
        }
        let length = r.u32()?;
        if length > config.max_item_length {
            return Err(DecodeError::ItemTooLarge {
                index,
                length,
                max: config.max_item_length,
            });
        }
        let item = r.take(length as usize)?;
        running = FileHash::digest_parts(&[running.as_bytes(), item]);

        let record = decode_item(kind, version, item).map_err(|e| match e {
            DecodeError::MalformedItem { reason, .. } => DecodeError::MalformedItem { index, reason },
            other => DecodeError::MalformedItem {
                index,
                reason: other.to_string(),
            },
        })?;

        let ts = record.consensus_timestamp;
        if ts < period_start || ts >= period_end {
            return Err(DecodeError::TimestampOutOfPeriod {
                index,
                timestamp: ts,
            });
        }
        let ordered = match kind {
            // Every row of a snapshot carries the snapshot timestamp.
            StreamKind::Balance => ts == period_start,
            StreamKind::Transaction | StreamKind::Event => last_ts.map_or(true, |prev| ts > prev),
        };
        if !ordered {
            return Err(DecodeError::TimestampOutOfOrder {
                index,
                timestamp: ts,
            });
        }
        last_ts = Some(ts);

        if kind == StreamKind::Balance && !accounts.insert(record.entity_reference) {
            return Err(DecodeError::DuplicateAccount {
                index,
                account: record.entity_reference,
            });
        }

        bloom.accumulate(record.bloom());
        records.push(record);
    }

    if r.remaining() > HASH_LENGTH {
        return Err(extra_items_or_trailing(&mut r, item_count));
    }
    let declared = r.hash()?;
    if declared != running {
        return Err(DecodeError::RunningHashMismatch {
            declared,
            computed: running,
        });
    }

    let header = StreamFileHeader {
        kind,
        version,
        period_start,
        period_end,
        content_hash: FileHash::digest(bytes),
        previous_hash,
        item_count,
        raw_size: bytes.len() as u64,
    };

    Ok(DecodedFile {
        header,
        records,
        bloom,
    })
}

/// Classify bytes left after the declared items: whole extra items followed
/// by a trailer mean the count was wrong, anything else is trailing garbage.
fn extra_items_or_trailing(r: &mut Reader<'_>, declared: u32) -> DecodeError {
    let trailing = r.remaining() - HASH_LENGTH;
    let mut extra: u32 = 0;
    while r.remaining() > HASH_LENGTH {
        if r.bytes_u32().is_err() {
            return DecodeError::TrailingBytes { count: trailing };
        }
        extra = extra.saturating_add(1);
    }
    if r.remaining() == HASH_LENGTH {
        DecodeError::ItemCountMismatch {
            declared,
            actual: declared.saturating_add(extra),
        }
    } else {
        DecodeError::TrailingBytes { count: trailing }
    }
}

fn decode_item(kind: StreamKind, version: u32, item: &[u8]) -> Result<DecodedRecord, DecodeError> {
    let mut r = Reader::new(item);
    let record = match kind {
        StreamKind::Transaction => {
            let ts = r.u64()?;
            let payer = r.entity()?;
            let transaction_type = r.u16()?;
            let result = r.u16()?;
            let fee = r.u64()?;

            let n = r.u16()?;
            let mut transfers = Vec::with_capacity(n as usize);
            for _ in 0..n {
                transfers.push(Transfer {
                    account: r.entity()?,
                    amount: r.i64()?,
                });
            }

            let mut token_transfers = Vec::new();
            let mut bloom = None;
            if version >= VERSION_2 {
                let n = r.u16()?;
                token_transfers.reserve(n as usize);
                for _ in 0..n {
                    token_transfers.push(TokenTransfer {
                        token: r.entity()?,
                        account: r.entity()?,
                        amount: r.i64()?,
                    });
                }
                let field = r.bytes_u32()?;
                bloom = LogsBloom::from_field(field).map_err(|e| DecodeError::MalformedItem {
                    index: 0,
                    reason: e.to_string(),
                })?;
            }

            DecodedRecord::transaction(
                ts,
                payer,
                TransactionPayload {
                    transaction_type,
                    result,
                    fee,
                    transfers,
                    token_transfers,
                    bloom,
                },
            )
        }
        StreamKind::Balance => {
            let ts = r.u64()?;
            let account = r.entity()?;
            let balance = r.i64()?;
            let n = r.u16()?;
            let mut tokens: Vec<TokenBalance> = Vec::with_capacity(n as usize);
            for _ in 0..n {
                let token = r.entity()?;
                if tokens.iter().any(|t| t.token == token) {
                    return Err(DecodeError::MalformedItem {
                        index: 0,
                        reason: format!("token {} listed twice", token),
                    });
                }
                tokens.push(TokenBalance {
                    token,
                    balance: r.i64()?,
                });
            }
            DecodedRecord::balance(ts, account, balance, tokens)
        }
        StreamKind::Event => {
            let ts = r.u64()?;
            let creator = r.u64()?;
            let sequence = r.u64()?;
            let data = r.bytes_u32()?.to_vec();
            DecodedRecord::event(ts, creator, sequence, data)
        }
    };
    if r.remaining() != 0 {
        return Err(DecodeError::TrailingBytes {
            count: r.remaining(),
        });
    }
    Ok(record)
}
