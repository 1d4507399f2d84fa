//! # KV Lease Store
//!
//! Leases live in the shared key-value store under `ls/<job>`. Every
//! transition is a compare-and-set on the raw lease bytes, so two instances
//! sharing one store can never both hold a job.

use shared_types::ConsensusTimestamp;
use sm_06_leader_gate::{Lease, LeaseError, LeaseStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::KVStoreError;
use crate::domain::keys;
use crate::ports::outbound::{BatchOperation, KeyValueStore, Precondition};

/// [`LeaseStore`] over a [`KeyValueStore`].
pub struct KvLeaseStore {
    store: Arc<dyn KeyValueStore>,
}

impl KvLeaseStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self, job: &str) -> Result<(Option<Vec<u8>>, Option<Lease>), LeaseError> {
        let raw = self.store.get(&keys::lease(job)).map_err(storage)?;
        let lease = match &raw {
            Some(bytes) => Some(
                bincode::deserialize(bytes).map_err(|e| LeaseError::Storage(e.to_string()))?,
            ),
            None => None,
        };
        Ok((raw, lease))
    }

    /// Write `next` only if the row still holds `raw`. A lost race is a
    /// denial, not an error.
    fn swap(&self, job: &str, raw: Option<Vec<u8>>, next: BatchOperation) -> Result<bool, LeaseError> {
        let key = keys::lease(job);
        match self
            .store
            .conditional_batch_write(vec![Precondition::equals(key, raw)], vec![next])
        {
            Ok(()) => Ok(true),
            Err(KVStoreError::ConditionFailed { .. }) => Ok(false),
            Err(e) => Err(storage(e)),
        }
    }

    fn write(&self, job: &str, raw: Option<Vec<u8>>, lease: Option<Lease>) -> Result<bool, LeaseError> {
        let Some(lease) = lease else {
            return Ok(false);
        };
        let bytes = bincode::serialize(&lease).map_err(|e| LeaseError::Storage(e.to_string()))?;
        self.swap(job, raw, BatchOperation::put(keys::lease(job), bytes))
    }
}

fn storage(e: KVStoreError) -> LeaseError {
    LeaseError::Storage(e.to_string())
}

impl LeaseStore for KvLeaseStore {
    fn try_acquire(
        &self,
        job: &str,
        holder: Uuid,
        now: ConsensusTimestamp,
        ttl_nanos: u64,
    ) -> Result<bool, LeaseError> {
        let (raw, existing) = self.load(job)?;
        let granted = Lease::grant(existing.as_ref(), job, holder, now, ttl_nanos);
        self.write(job, raw, granted)
    }

    fn renew(
        &self,
        job: &str,
        holder: Uuid,
        now: ConsensusTimestamp,
        ttl_nanos: u64,
    ) -> Result<bool, LeaseError> {
        let (raw, existing) = self.load(job)?;
        let renewed = Lease::renewal(existing.as_ref(), holder, now, ttl_nanos);
        self.write(job, raw, renewed)
    }

    fn release(&self, job: &str, holder: Uuid) -> Result<bool, LeaseError> {
        let (raw, existing) = self.load(job)?;
        if !existing.is_some_and(|l| l.holder == holder) {
            return Ok(false);
        }
        self.swap(job, raw, BatchOperation::delete(keys::lease(job)))
    }

    fn current(&self, job: &str) -> Result<Option<Lease>, LeaseError> {
        Ok(self.load(job)?.1)
    }
}
