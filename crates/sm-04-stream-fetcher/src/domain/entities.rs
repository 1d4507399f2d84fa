//! # Fetcher Entities

use serde::{Deserialize, Serialize};
use shared_types::{ConsensusTimestamp, NodeId, StreamKind};
use sm_03_quorum_verification::SignatureAssertion;
use std::fmt;

/// The two objects a node exports per stream file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// The stream file bytes.
    Data,
    /// The node's signature object over the file hash.
    Signature,
}

impl ObjectType {
    /// File extension in the bucket layout.
    pub fn extension(self) -> &'static str {
        match self {
            ObjectType::Data => "sm",
            ObjectType::Signature => "sig",
        }
    }

    /// Inverse of [`ObjectType::extension`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "sm" => Some(ObjectType::Data),
            "sig" => Some(ObjectType::Signature),
            _ => None,
        }
    }
}

/// A source excluded from a round, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub node_id: NodeId,
    pub reason: String,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}: {}", self.node_id, self.reason)
    }
}

/// The next unprocessed period of one stream, with every signature gathered
/// for it this round.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub kind: StreamKind,
    /// `period_start` of the candidate.
    pub period: ConsensusTimestamp,
    pub assertions: Vec<SignatureAssertion>,
    /// Sources asked for a signature object.
    pub queried: usize,
    /// Sources excluded from this round.
    pub failures: Vec<SourceFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions_round_trip() {
        for ty in [ObjectType::Data, ObjectType::Signature] {
            assert_eq!(ObjectType::from_extension(ty.extension()), Some(ty));
        }
        assert_eq!(ObjectType::from_extension("json"), None);
    }
}
