//! # Consensus Node Registry
//!
//! Holder of the current [`RegistrySnapshot`]. Readers take an `Arc` of the
//! snapshot and keep using it for the whole verification round even if a
//! refresh lands meanwhile.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::domain::entities::{ConsensusNode, RegistrySnapshot};
use crate::domain::errors::RegistryError;

/// Current set of signing nodes.
#[derive(Debug)]
pub struct ConsensusNodeRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl ConsensusNodeRegistry {
    /// Create a registry from an initial snapshot.
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Build a registry directly from nodes.
    pub fn from_nodes(nodes: Vec<ConsensusNode>) -> Result<Self, RegistryError> {
        Ok(Self::new(RegistrySnapshot::new(nodes)?))
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Replace the snapshot wholesale.
    pub fn replace(&self, snapshot: RegistrySnapshot) {
        info!(
            "[sm-01] Registry refreshed: {} nodes, total stake {}",
            snapshot.len(),
            snapshot.total_stake()
        );
        *self.current.write() = Arc::new(snapshot);
    }
}
