//! # Leader Gate Service

use parking_lot::Mutex;
use shared_types::{SystemTimeSource, TimeSource};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::LeaderConfig;
use crate::ports::outbound::LeaseStore;

/// One instance's view of job leadership.
pub struct LeaderGate {
    store: Arc<dyn LeaseStore>,
    holder: Uuid,
    ttl_nanos: u64,
    clock: Arc<dyn TimeSource>,
    /// Jobs this instance believes it leads, for transition logging.
    held: Mutex<HashSet<String>>,
}

impl LeaderGate {
    /// Gate with a fresh random holder id on the system clock.
    pub fn new(store: Arc<dyn LeaseStore>, config: &LeaderConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemTimeSource))
    }

    pub fn with_clock(
        store: Arc<dyn LeaseStore>,
        config: &LeaderConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            store,
            holder: Uuid::new_v4(),
            ttl_nanos: config.lease_ttl().as_nanos() as u64,
            clock,
            held: Mutex::new(HashSet::new()),
        }
    }

    /// This instance's lease holder id.
    pub fn holder_id(&self) -> Uuid {
        self.holder
    }

    /// Become (or stay) leader of `job`. Storage failures deny leadership.
    pub fn try_acquire(&self, job: &str) -> bool {
        let now = self.clock.now_nanos();
        let granted = match self.store.try_acquire(job, self.holder, now, self.ttl_nanos) {
            Ok(granted) => granted,
            Err(e) => {
                warn!("[sm-06] Lease check for '{}' failed: {}", job, e);
                false
            }
        };

        let mut held = self.held.lock();
        if granted {
            if held.insert(job.to_string()) {
                info!("[sm-06] Instance {} is now leader of '{}'", self.holder, job);
            }
        } else if held.remove(job) {
            warn!("[sm-06] Instance {} lost leadership of '{}'", self.holder, job);
        }
        granted
    }

    /// Extend an existing lease without taking over a free one.
    pub fn renew(&self, job: &str) -> bool {
        let now = self.clock.now_nanos();
        match self.store.renew(job, self.holder, now, self.ttl_nanos) {
            Ok(renewed) => renewed,
            Err(e) => {
                warn!("[sm-06] Lease renewal for '{}' failed: {}", job, e);
                false
            }
        }
    }

    /// Give up `job` so another instance can take it immediately.
    pub fn release(&self, job: &str) {
        self.held.lock().remove(job);
        match self.store.release(job, self.holder) {
            Ok(true) => info!("[sm-06] Instance {} released '{}'", self.holder, job),
            Ok(false) => {}
            Err(e) => warn!("[sm-06] Releasing '{}' failed: {}", job, e),
        }
    }

    /// Release every job this instance leads.
    pub fn release_all(&self) {
        let jobs: Vec<String> = self.held.lock().iter().cloned().collect();
        for job in jobs {
            self.release(&job);
        }
    }
}
