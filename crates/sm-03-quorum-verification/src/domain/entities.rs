//! # Domain Entities
//!
//! Transient data of one verification window.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{ConsensusTimestamp, FileHash, NodeId, StreamKind};

/// Length of an ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// One node's signed claim about the hash of a stream file.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureAssertion {
    pub node_id: NodeId,
    pub kind: StreamKind,
    /// `period_start` of the file the claim is about.
    pub period: ConsensusTimestamp,
    pub claimed_hash: FileHash,
    #[serde_as(as = "Bytes")]
    pub signature: [u8; SIGNATURE_LENGTH],
}

/// Stake supporting one claimed hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashTally {
    pub hash: FileHash,
    pub stake: u128,
    /// Nodes with a valid signature for `hash`, in submission order.
    pub nodes: Vec<NodeId>,
}

/// Result of an accepted quorum round.
#[derive(Clone, Debug)]
pub struct QuorumDecision {
    pub kind: StreamKind,
    pub period: ConsensusTimestamp,
    pub accepted_hash: FileHash,
    pub supporting_stake: u128,
    pub total_stake: u128,
    /// Valid assertions that agree with `accepted_hash` (the audit trail).
    pub supporting: Vec<SignatureAssertion>,
    /// Tallies for every other hash, which are discarded.
    pub discarded: Vec<HashTally>,
    /// Nodes whose assertion was not counted (bad signature or unknown node).
    pub rejected_nodes: Vec<NodeId>,
}

impl QuorumDecision {
    /// Nodes that signed the accepted hash; the safe sources for downloading
    /// the file itself.
    pub fn supporting_nodes(&self) -> Vec<NodeId> {
        self.supporting.iter().map(|a| a.node_id).collect()
    }
}
