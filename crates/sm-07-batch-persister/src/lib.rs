//! # Batch Persister (SM-07)
//!
//! Commits one decoded stream file as a single atomic write.
//!
//! ## Guarantees
//!
//! - **Atomic**: every row of a file plus the advanced watermark go into one
//!   batch; readers see all of it or none of it.
//! - **Idempotent**: rows are keyed by natural key, so re-applying a file
//!   overwrites identical values. A file whose hash is already the watermark
//!   is reported as [`CommitOutcome::AlreadyApplied`] without writing.
//! - **Chain-checked**: the file's previous hash is validated against the
//!   watermark read, and the batch only lands if the watermark is still
//!   that value at write time. A concurrent writer makes the commit fail
//!   with a retryable error instead of forking the chain.
//!
//! ## Storage
//!
//! Everything sits on the [`KeyValueStore`] port. Keys are a short prefix
//! followed by big-endian fields, so prefix and range scans come back in
//! timestamp order. Values are `bincode`.
//!
//! The same store also backs the leader lease table ([`KvLeaseStore`]).

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::lease_store::KvLeaseStore;
pub use domain::entities::{
    AccountBalanceRow, BalanceSnapshotRow, CommitOutcome, CryptoTransferRow, EventRow,
    SignatureRow, StreamFileRow, TokenBalanceRow, TokenTransferRow, TransactionRow,
};
pub use domain::errors::{KVStoreError, PersistError};
pub use domain::keys;
pub use domain::translate::record_operations;
pub use ports::inbound::{BatchPersistApi, LedgerReader};
pub use ports::outbound::{BatchOperation, InMemoryKVStore, KeyValueStore, Precondition};
pub use service::BatchPersister;
