//! # KV Run Store
//!
//! Runs stored beside the ledger under `rr/<window_start>`, bincode-encoded.

use shared_types::ConsensusTimestamp;
use sm_07_batch_persister::{keys, KeyValueStore};
use std::sync::Arc;

use crate::domain::entities::ReconciliationRun;
use crate::domain::errors::ReconciliationError;
use crate::ports::outbound::RunStore;

pub struct KvRunStore {
    store: Arc<dyn KeyValueStore>,
}

impl KvRunStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

fn storage(e: impl std::fmt::Display) -> ReconciliationError {
    ReconciliationError::RunStorage(e.to_string())
}

fn decode(bytes: &[u8]) -> Result<ReconciliationRun, ReconciliationError> {
    bincode::deserialize(bytes).map_err(storage)
}

impl RunStore for KvRunStore {
    fn save(&self, run: &ReconciliationRun) -> Result<(), ReconciliationError> {
        let value = bincode::serialize(run).map_err(storage)?;
        self.store
            .put(&keys::reconciliation_run(run.window_start), &value)
            .map_err(storage)
    }

    fn get(&self, window_start: ConsensusTimestamp) -> Result<Option<ReconciliationRun>, ReconciliationError> {
        match self
            .store
            .get(&keys::reconciliation_run(window_start))
            .map_err(storage)?
        {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn latest(&self) -> Result<Option<ReconciliationRun>, ReconciliationError> {
        let entries = self
            .store
            .prefix_scan(keys::RECONCILIATION_RUN)
            .map_err(storage)?;
        entries.last().map(|(_, v)| decode(v)).transpose()
    }

    fn all(&self) -> Result<Vec<ReconciliationRun>, ReconciliationError> {
        self.store
            .prefix_scan(keys::RECONCILIATION_RUN)
            .map_err(storage)?
            .iter()
            .map(|(_, v)| decode(v))
            .collect()
    }
}
