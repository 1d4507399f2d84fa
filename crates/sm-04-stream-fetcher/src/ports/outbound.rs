//! # Outbound Ports
//!
//! The object-storage source, one bucket per node.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{ConsensusTimestamp, NodeId, StreamKind};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::domain::entities::ObjectType;
use crate::domain::layout::{object_key, parse_object_name};

/// Failure of one source. Always confined to the round and the source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("malformed object: {0}")]
    Malformed(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to the exported objects of every node.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Periods after `after` for which `node_id` has published a signature
    /// object, ascending, at most `limit`.
    async fn list_periods(
        &self,
        kind: StreamKind,
        node_id: NodeId,
        after: Option<ConsensusTimestamp>,
        limit: usize,
    ) -> Result<Vec<ConsensusTimestamp>, SourceError>;

    /// Fetch one object. `Ok(None)` means not found.
    async fn get(
        &self,
        kind: StreamKind,
        period: ConsensusTimestamp,
        node_id: NodeId,
        object: ObjectType,
    ) -> Result<Option<Vec<u8>>, SourceError>;
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// In-memory source for tests and simulations.
///
/// Nodes can be marked failing (every call errors) or stalled (every call
/// hangs until the caller's timeout).
#[derive(Default)]
pub struct InMemorySource {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    failing: RwLock<HashSet<NodeId>>,
    stalled: RwLock<HashSet<NodeId>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an object.
    pub fn put(
        &self,
        kind: StreamKind,
        node_id: NodeId,
        period: ConsensusTimestamp,
        object: ObjectType,
        bytes: Vec<u8>,
    ) {
        self.objects
            .write()
            .insert(object_key(kind, node_id, period, object), bytes);
    }

    /// Remove an object.
    pub fn remove(
        &self,
        kind: StreamKind,
        node_id: NodeId,
        period: ConsensusTimestamp,
        object: ObjectType,
    ) {
        self.objects
            .write()
            .remove(&object_key(kind, node_id, period, object));
    }

    pub fn set_failing(&self, node_id: NodeId, failing: bool) {
        toggle(&self.failing, node_id, failing);
    }

    pub fn set_stalled(&self, node_id: NodeId, stalled: bool) {
        toggle(&self.stalled, node_id, stalled);
    }

    async fn gate(&self, node_id: NodeId) -> Result<(), SourceError> {
        if self.failing.read().contains(&node_id) {
            return Err(SourceError::Unavailable(format!("node {node_id} is down")));
        }
        if self.stalled.read().contains(&node_id) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

fn toggle(set: &RwLock<HashSet<NodeId>>, node_id: NodeId, on: bool) {
    let mut set = set.write();
    if on {
        set.insert(node_id);
    } else {
        set.remove(&node_id);
    }
}

#[async_trait]
impl StreamSource for InMemorySource {
    async fn list_periods(
        &self,
        kind: StreamKind,
        node_id: NodeId,
        after: Option<ConsensusTimestamp>,
        limit: usize,
    ) -> Result<Vec<ConsensusTimestamp>, SourceError> {
        self.gate(node_id).await?;
        let prefix = format!("{}/{}/", kind.as_str(), node_id);
        let objects = self.objects.read();
        let periods = objects
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| parse_object_name(&key[prefix.len()..]))
            .filter(|(period, object)| {
                *object == ObjectType::Signature && after.map_or(true, |a| *period > a)
            })
            .map(|(period, _)| period)
            .take(limit)
            .collect();
        Ok(periods)
    }

    async fn get(
        &self,
        kind: StreamKind,
        period: ConsensusTimestamp,
        node_id: NodeId,
        object: ObjectType,
    ) -> Result<Option<Vec<u8>>, SourceError> {
        self.gate(node_id).await?;
        Ok(self
            .objects
            .read()
            .get(&object_key(kind, node_id, period, object))
            .cloned())
    }
}
