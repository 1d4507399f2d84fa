//! # Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_types::{ConsensusTimestamp, FileHash, NodeId, ShutdownSignal, StreamKind};
use sm_01_node_registry::RegistrySnapshot;

use crate::domain::entities::CandidateFile;
use crate::domain::errors::FetchError;

/// Fetcher API used by the download loop.
#[async_trait]
pub trait StreamFetchApi: Send + Sync {
    /// Find the earliest period after `after` that any responsive node
    /// advertises and gather every node's signature object for it.
    ///
    /// `Ok(None)` means no source has anything new.
    async fn fetch_candidate(
        &self,
        kind: StreamKind,
        after: Option<ConsensusTimestamp>,
        snapshot: &RegistrySnapshot,
        shutdown: &ShutdownSignal,
    ) -> Result<Option<CandidateFile>, FetchError>;

    /// Download the file bytes from the first of `nodes` that serves bytes
    /// hashing to `expected`.
    async fn download_verified(
        &self,
        kind: StreamKind,
        period: ConsensusTimestamp,
        expected: &FileHash,
        nodes: &[NodeId],
        shutdown: &ShutdownSignal,
    ) -> Result<Vec<u8>, FetchError>;
}
