//! # RocksDB Storage Adapter
//!
//! RocksDB implementation of the persister's `KeyValueStore`.
//!
//! ## Column Families
//!
//! Keys are routed by their three-byte prefix:
//!
//! - `ledger` - transactions, transfers, balances, snapshots, events
//! - `files` - stream file rows and signature audit rows
//! - `control` - watermarks, leases, reconciliation runs
//!
//! ## Atomicity
//!
//! Every write takes the store's write lock, so a conditional batch checks
//! its preconditions and applies its `WriteBatch` with no other writer in
//! between. RocksDB's own lock file keeps a second process from opening the
//! same directory; instances that scale out share one storage process.

use parking_lot::RwLock;
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, Direction,
    IteratorMode, Options, WriteBatch, WriteOptions, DB,
};
use sm_07_batch_persister::keys;
use sm_07_batch_persister::ports::outbound::display_key;
use sm_07_batch_persister::{BatchOperation, KVStoreError, KeyValueStore, Precondition};
use std::path::PathBuf;

pub const CF_LEDGER: &str = "ledger";
pub const CF_FILES: &str = "files";
pub const CF_CONTROL: &str = "control";

pub const COLUMN_FAMILIES: &[&str] = &[CF_LEDGER, CF_FILES, CF_CONTROL];

const PREFIX_LEN: usize = 3;

/// Column family holding keys that start with `prefix`.
fn family_of(prefix: &[u8]) -> Option<&'static str> {
    let head = prefix.get(..PREFIX_LEN)?;
    if [keys::STREAM_FILE, keys::SIGNATURE].contains(&head) {
        Some(CF_FILES)
    } else if [keys::WATERMARK, keys::LEASE, keys::RECONCILIATION_RUN].contains(&head) {
        Some(CF_CONTROL)
    } else {
        Some(CF_LEDGER)
    }
}

#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// Target file size for level-1 (default: 64MB)
    pub target_file_size_base: u64,
    /// fsync after each write
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/rocksdb"),
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
            target_file_size_base: 64 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            target_file_size_base: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

pub struct RocksDbStore {
    db: RwLock<DB>,
    config: RocksDbConfig,
}

fn io_error(context: &str, e: rocksdb::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: format!("RocksDB {} failed: {}", context, e),
    }
}

impl RocksDbStore {
    /// Open or create the database with every column family.
    pub fn open(config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_target_file_size_base(config.target_file_size_base);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, descriptors)
            .map_err(|e| io_error("open", e))?;

        Ok(Self {
            db: RwLock::new(db),
            config,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.config.path
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.config.sync_writes);
        opts
    }
}

fn handle<'a>(db: &'a DB, key: &[u8]) -> Result<&'a ColumnFamily, KVStoreError> {
    let name = family_of(key).ok_or_else(|| KVStoreError::CorruptionError {
        message: format!("key {} has no storage prefix", display_key(key)),
    })?;
    db.cf_handle(name).ok_or_else(|| KVStoreError::CorruptionError {
        message: format!("missing column family {}", name),
    })
}

/// Forward scan of one family from `start` while `keep` holds.
fn scan_family(
    db: &DB,
    cf: &ColumnFamily,
    start: &[u8],
    keep: impl Fn(&[u8]) -> bool,
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
    let mut results = Vec::new();
    for item in db.iterator_cf(cf, IteratorMode::From(start, Direction::Forward)) {
        let (key, value) = item.map_err(|e| io_error("scan", e))?;
        if !keep(&key[..]) {
            break;
        }
        results.push((key.to_vec(), value.to_vec()));
    }
    Ok(results)
}

/// Scan every family and merge by key, for scans not bound to one prefix.
fn scan_all(
    db: &DB,
    start: &[u8],
    keep: impl Fn(&[u8]) -> bool + Copy,
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
    let mut results = Vec::new();
    for name in COLUMN_FAMILIES {
        let cf = db.cf_handle(name).ok_or_else(|| KVStoreError::CorruptionError {
            message: format!("missing column family {}", name),
        })?;
        results.extend(scan_family(db, cf, start, keep)?);
    }
    results.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(results)
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        let db = self.db.read();
        db.get_cf(handle(&db, key)?, key)
            .map_err(|e| io_error("get", e))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        let db = self.db.write();
        db.put_cf_opt(handle(&db, key)?, key, value, &self.write_options())
            .map_err(|e| io_error("put", e))
    }

    fn delete(&self, key: &[u8]) -> Result<(), KVStoreError> {
        let db = self.db.write();
        db.delete_cf_opt(handle(&db, key)?, key, &self.write_options())
            .map_err(|e| io_error("delete", e))
    }

    fn conditional_batch_write(
        &self,
        preconditions: Vec<Precondition>,
        operations: Vec<BatchOperation>,
    ) -> Result<(), KVStoreError> {
        let db = self.db.write();

        for p in &preconditions {
            let current = db
                .get_cf(handle(&db, &p.key)?, &p.key)
                .map_err(|e| io_error("get", e))?;
            if current != p.expected {
                return Err(KVStoreError::ConditionFailed {
                    key: display_key(&p.key),
                });
            }
        }

        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put_cf(handle(&db, &key)?, &key, &value),
                BatchOperation::Delete { key } => batch.delete_cf(handle(&db, &key)?, &key),
            }
        }

        db.write_opt(batch, &self.write_options())
            .map_err(|e| io_error("batch write", e))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let db = self.db.read();
        let keep = |key: &[u8]| key.starts_with(prefix);
        if prefix.len() < PREFIX_LEN {
            return scan_all(&db, prefix, keep);
        }
        scan_family(&db, handle(&db, prefix)?, prefix, keep)
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        if !end.is_empty() && start >= end {
            return Ok(Vec::new());
        }
        let db = self.db.read();
        let keep = |key: &[u8]| end.is_empty() || key < end;
        let within_prefix = start.len() >= PREFIX_LEN
            && !end.is_empty()
            && end <= keys::prefix_end(&start[..PREFIX_LEN]).as_slice();
        if within_prefix {
            scan_family(&db, handle(&db, start)?, start, keep)
        } else {
            scan_all(&db, start, keep)
        }
    }
}
