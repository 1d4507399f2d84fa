//! # Outbound Ports
//!
//! Where runs are recorded. Committed rows are read through
//! `sm_07_batch_persister::LedgerReader`.

use parking_lot::RwLock;
use shared_types::ConsensusTimestamp;
use std::collections::BTreeMap;

use crate::domain::entities::ReconciliationRun;
use crate::domain::errors::ReconciliationError;

pub trait RunStore: Send + Sync {
    /// Insert or replace the run keyed by its `window_start`.
    fn save(&self, run: &ReconciliationRun) -> Result<(), ReconciliationError>;

    fn get(&self, window_start: ConsensusTimestamp) -> Result<Option<ReconciliationRun>, ReconciliationError>;

    /// Run with the greatest `window_start`.
    fn latest(&self) -> Result<Option<ReconciliationRun>, ReconciliationError>;

    /// Every run, ascending by `window_start`.
    fn all(&self) -> Result<Vec<ReconciliationRun>, ReconciliationError>;
}

#[derive(Default)]
pub struct InMemoryRunStore {
    runs: RwLock<BTreeMap<ConsensusTimestamp, ReconciliationRun>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunStore for InMemoryRunStore {
    fn save(&self, run: &ReconciliationRun) -> Result<(), ReconciliationError> {
        self.runs.write().insert(run.window_start, run.clone());
        Ok(())
    }

    fn get(&self, window_start: ConsensusTimestamp) -> Result<Option<ReconciliationRun>, ReconciliationError> {
        Ok(self.runs.read().get(&window_start).cloned())
    }

    fn latest(&self) -> Result<Option<ReconciliationRun>, ReconciliationError> {
        Ok(self.runs.read().values().next_back().cloned())
    }

    fn all(&self) -> Result<Vec<ReconciliationRun>, ReconciliationError> {
        Ok(self.runs.read().values().cloned().collect())
    }
}
