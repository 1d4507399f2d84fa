//! # Outbound Ports (Driven Ports)
//!
//! The key-value backend shared by every instance of the service.
//!
//! Production: `RocksDbStore` (node-runtime, `rocksdb` feature)
//! Testing: [`InMemoryKVStore`] (below)

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::domain::errors::KVStoreError;

/// Abstract interface for key-value database operations.
///
/// Scans return entries in ascending key order.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Delete a key.
    fn delete(&self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Apply `operations` only if every precondition holds, atomically with
    /// respect to all other writers. Either all operations are applied or
    /// none are; a failed precondition returns `ConditionFailed`.
    fn conditional_batch_write(
        &self,
        preconditions: Vec<Precondition>,
        operations: Vec<BatchOperation>,
    ) -> Result<(), KVStoreError>;

    /// Execute an atomic batch write.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.conditional_batch_write(Vec::new(), operations)
    }

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Iterate over keys with a prefix.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError>;

    /// Entries with `start <= key < end`. An empty `end` is unbounded.
    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Required state of one key for a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub key: Vec<u8>,
    /// `None` requires the key to be absent.
    pub expected: Option<Vec<u8>>,
}

impl Precondition {
    pub fn equals(key: impl Into<Vec<u8>>, expected: Option<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            expected,
        }
    }
}

/// Render a key for error messages.
pub fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

/// In-memory key-value store for tests and single-process runs.
///
/// A single `RwLock` makes conditional batches atomic. Share it between
/// simulated instances with `Arc`.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full copy of the contents.
    pub fn dump(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.data.read().clone()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), KVStoreError> {
        self.data.write().remove(key);
        Ok(())
    }

    fn conditional_batch_write(
        &self,
        preconditions: Vec<Precondition>,
        operations: Vec<BatchOperation>,
    ) -> Result<(), KVStoreError> {
        let mut data = self.data.write();
        for p in &preconditions {
            if data.get(&p.key) != p.expected.as_ref() {
                return Err(KVStoreError::ConditionFailed {
                    key: display_key(&p.key),
                });
            }
        }
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let data = self.data.read();
        Ok(data
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let data = self.data.read();
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        if !end.is_empty() && start >= end {
            return Ok(Vec::new());
        }
        Ok(data
            .range::<[u8], _>((Bound::Included(start), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
