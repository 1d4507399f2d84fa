//! # Key Layout
//!
//! `prefix || big-endian fields`. Timestamps lead wherever rows are scanned
//! by time so byte order equals time order.

use shared_types::{ConsensusTimestamp, EntityId, NodeId, StreamKind};

pub const TRANSACTION: &[u8] = b"tx/";
pub const CRYPTO_TRANSFER: &[u8] = b"ct/";
pub const TOKEN_TRANSFER: &[u8] = b"tt/";
pub const ACCOUNT_BALANCE: &[u8] = b"ab/";
pub const TOKEN_BALANCE: &[u8] = b"tb/";
pub const BALANCE_SNAPSHOT: &[u8] = b"bs/";
pub const EVENT: &[u8] = b"ev/";
pub const STREAM_FILE: &[u8] = b"sf/";
pub const SIGNATURE: &[u8] = b"sg/";
pub const WATERMARK: &[u8] = b"wm/";
pub const LEASE: &[u8] = b"ls/";
pub const RECONCILIATION_RUN: &[u8] = b"rr/";

/// All prefixes, for adapters that route keys.
pub const ALL_PREFIXES: [&[u8]; 12] = [
    TRANSACTION,
    CRYPTO_TRANSFER,
    TOKEN_TRANSFER,
    ACCOUNT_BALANCE,
    TOKEN_BALANCE,
    BALANCE_SNAPSHOT,
    EVENT,
    STREAM_FILE,
    SIGNATURE,
    WATERMARK,
    LEASE,
    RECONCILIATION_RUN,
];

struct KeyBuilder(Vec<u8>);

impl KeyBuilder {
    fn new(prefix: &[u8]) -> Self {
        let mut key = Vec::with_capacity(prefix.len() + 64);
        key.extend_from_slice(prefix);
        Self(key)
    }

    fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    fn u64(mut self, v: u64) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn entity(self, id: &EntityId) -> Self {
        self.u64(id.shard).u64(id.realm).u64(id.num)
    }

    fn bytes(mut self, v: &[u8]) -> Self {
        self.0.extend_from_slice(v);
        self
    }

    fn build(self) -> Vec<u8> {
        self.0
    }
}

pub fn transaction(ts: ConsensusTimestamp) -> Vec<u8> {
    KeyBuilder::new(TRANSACTION).u64(ts).build()
}

pub fn crypto_transfer(ts: ConsensusTimestamp, account: &EntityId) -> Vec<u8> {
    KeyBuilder::new(CRYPTO_TRANSFER).u64(ts).entity(account).build()
}

pub fn token_transfer(ts: ConsensusTimestamp, token: &EntityId, account: &EntityId) -> Vec<u8> {
    KeyBuilder::new(TOKEN_TRANSFER)
        .u64(ts)
        .entity(token)
        .entity(account)
        .build()
}

pub fn account_balance(ts: ConsensusTimestamp, account: &EntityId) -> Vec<u8> {
    KeyBuilder::new(ACCOUNT_BALANCE).u64(ts).entity(account).build()
}

pub fn token_balance(ts: ConsensusTimestamp, account: &EntityId, token: &EntityId) -> Vec<u8> {
    KeyBuilder::new(TOKEN_BALANCE)
        .u64(ts)
        .entity(account)
        .entity(token)
        .build()
}

pub fn balance_snapshot(ts: ConsensusTimestamp) -> Vec<u8> {
    KeyBuilder::new(BALANCE_SNAPSHOT).u64(ts).build()
}

pub fn event(ts: ConsensusTimestamp) -> Vec<u8> {
    KeyBuilder::new(EVENT).u64(ts).build()
}

pub fn stream_file(kind: StreamKind, period: ConsensusTimestamp) -> Vec<u8> {
    KeyBuilder::new(STREAM_FILE).u8(kind.tag()).u64(period).build()
}

pub fn stream_files_of(kind: StreamKind) -> Vec<u8> {
    KeyBuilder::new(STREAM_FILE).u8(kind.tag()).build()
}

pub fn signature(kind: StreamKind, period: ConsensusTimestamp, node_id: NodeId) -> Vec<u8> {
    KeyBuilder::new(SIGNATURE)
        .u8(kind.tag())
        .u64(period)
        .u64(node_id)
        .build()
}

pub fn signatures_of(kind: StreamKind, period: ConsensusTimestamp) -> Vec<u8> {
    KeyBuilder::new(SIGNATURE).u8(kind.tag()).u64(period).build()
}

pub fn watermark(kind: StreamKind) -> Vec<u8> {
    KeyBuilder::new(WATERMARK).u8(kind.tag()).build()
}

pub fn lease(job: &str) -> Vec<u8> {
    KeyBuilder::new(LEASE).bytes(job.as_bytes()).build()
}

pub fn reconciliation_run(window_start: ConsensusTimestamp) -> Vec<u8> {
    KeyBuilder::new(RECONCILIATION_RUN).u64(window_start).build()
}

/// Smallest key greater than every key starting with `prefix`.
pub fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return end;
        }
    }
    // All 0xFF: no finite upper bound; callers fall back to a prefix scan.
    Vec::new()
}

/// `[start, end)` bounds covering timestamps in `(after, upto]` under `prefix`.
pub fn timestamp_range(
    prefix: &[u8],
    after: ConsensusTimestamp,
    upto: ConsensusTimestamp,
) -> (Vec<u8>, Vec<u8>) {
    let start = match after.checked_add(1) {
        Some(ts) => KeyBuilder::new(prefix).u64(ts).build(),
        None => prefix_end(prefix),
    };
    let end = match upto.checked_add(1) {
        Some(ts) => KeyBuilder::new(prefix).u64(ts).build(),
        None => prefix_end(prefix),
    };
    (start, end)
}

/// Decode the leading big-endian timestamp of a key under `prefix`.
pub fn leading_timestamp(prefix: &[u8], key: &[u8]) -> Option<ConsensusTimestamp> {
    let field = key.strip_prefix(prefix)?.get(..8)?;
    Some(u64::from_be_bytes(field.try_into().ok()?))
}
