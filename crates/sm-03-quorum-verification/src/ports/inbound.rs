//! # Inbound Ports (Driving Ports / API)

use shared_types::{ConsensusTimestamp, StreamKind};
use sm_01_node_registry::RegistrySnapshot;

use crate::domain::entities::{QuorumDecision, SignatureAssertion};
use crate::domain::errors::QuorumError;

/// Primary quorum API.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait SignatureQuorumApi: Send + Sync {
    /// Decide the authentic hash of the `kind` file starting at `period`
    /// from every assertion gathered for it.
    fn verify(
        &self,
        kind: StreamKind,
        period: ConsensusTimestamp,
        assertions: &[SignatureAssertion],
        snapshot: &RegistrySnapshot,
    ) -> Result<QuorumDecision, QuorumError>;
}
