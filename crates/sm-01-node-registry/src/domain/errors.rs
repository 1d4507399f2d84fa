//! # Registry Errors

use shared_types::NodeId;
use thiserror::Error;

/// Errors raised while building or loading a registry snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A snapshot must contain at least one node.
    #[error("Registry snapshot has no nodes")]
    Empty,

    /// The same node id appeared twice.
    #[error("Duplicate node id {0} in registry")]
    DuplicateNode(NodeId),

    /// A public key was not a 32-byte ed25519 key in hex.
    #[error("Invalid public key for node {node_id}: {reason}")]
    InvalidPublicKey { node_id: NodeId, reason: String },

    /// The address book could not be read or parsed.
    #[error("Address book error: {0}")]
    AddressBook(String),
}
