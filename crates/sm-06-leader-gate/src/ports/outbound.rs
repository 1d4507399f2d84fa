//! # Outbound Ports
//!
//! The shared lease table.

use parking_lot::Mutex;
use shared_types::ConsensusTimestamp;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::entities::Lease;
use crate::domain::errors::LeaseError;

/// Conditional lease operations. Each call must be atomic with respect to
/// every other instance using the same store.
pub trait LeaseStore: Send + Sync {
    /// Take or renew the lease on `job`. `false` when another holder's lease
    /// is still live.
    fn try_acquire(
        &self,
        job: &str,
        holder: Uuid,
        now: ConsensusTimestamp,
        ttl_nanos: u64,
    ) -> Result<bool, LeaseError>;

    /// Extend a live lease held by `holder`.
    fn renew(
        &self,
        job: &str,
        holder: Uuid,
        now: ConsensusTimestamp,
        ttl_nanos: u64,
    ) -> Result<bool, LeaseError>;

    /// Drop the lease if `holder` owns it.
    fn release(&self, job: &str, holder: Uuid) -> Result<bool, LeaseError>;

    /// Current lease row, expired or not.
    fn current(&self, job: &str) -> Result<Option<Lease>, LeaseError>;
}

/// Lease table in process memory.
#[derive(Default)]
pub struct InMemoryLeaseStore {
    leases: Mutex<HashMap<String, Lease>>,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaseStore for InMemoryLeaseStore {
    fn try_acquire(
        &self,
        job: &str,
        holder: Uuid,
        now: ConsensusTimestamp,
        ttl_nanos: u64,
    ) -> Result<bool, LeaseError> {
        let mut leases = self.leases.lock();
        match Lease::grant(leases.get(job), job, holder, now, ttl_nanos) {
            Some(lease) => {
                leases.insert(job.to_string(), lease);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn renew(
        &self,
        job: &str,
        holder: Uuid,
        now: ConsensusTimestamp,
        ttl_nanos: u64,
    ) -> Result<bool, LeaseError> {
        let mut leases = self.leases.lock();
        match Lease::renewal(leases.get(job), holder, now, ttl_nanos) {
            Some(lease) => {
                leases.insert(job.to_string(), lease);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn release(&self, job: &str, holder: Uuid) -> Result<bool, LeaseError> {
        let mut leases = self.leases.lock();
        if leases.get(job).is_some_and(|l| l.holder == holder) {
            leases.remove(job);
            return Ok(true);
        }
        Ok(false)
    }

    fn current(&self, job: &str) -> Result<Option<Lease>, LeaseError> {
        Ok(self.leases.lock().get(job).cloned())
    }
}
