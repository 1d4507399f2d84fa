//! # Production Storage Adapters
//!
//! Enable the `rocksdb` feature to use the RocksDB backend:
//!
//! ```toml
//! node-runtime = { path = "...", features = ["rocksdb"] }
//! ```
//!
//! Without it the runtime only offers the in-memory store.

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{
    RocksDbConfig, RocksDbStore, CF_CONTROL, CF_FILES, CF_LEDGER, COLUMN_FAMILIES,
};

pub use sm_07_batch_persister::InMemoryKVStore;
