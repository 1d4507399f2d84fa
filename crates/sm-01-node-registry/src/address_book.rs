//! # Address Book
//!
//! JSON description of the signing nodes:
//!
//! ```json
//! { "nodes": [ { "node_id": 3, "public_key": "<64 hex chars>", "stake": 40 } ] }
//! ```
//!
//! `stake` may be omitted; an address book without any stake yields an
//! equal-weight snapshot.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::entities::{ConsensusNode, RegistrySnapshot, PUBLIC_KEY_LENGTH};
use crate::domain::errors::RegistryError;
use shared_types::NodeId;

/// One node as written in the address book file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressBookEntry {
    pub node_id: NodeId,
    /// Hex-encoded ed25519 public key.
    pub public_key: String,
    #[serde(default)]
    pub stake: u64,
}

/// Parsed address book.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddressBook {
    pub nodes: Vec<AddressBookEntry>,
}

impl AddressBook {
    /// Parse an address book from JSON text.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        serde_json::from_str(json).map_err(|e| RegistryError::AddressBook(e.to_string()))
    }

    /// Read and parse an address book file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::AddressBook(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Validate keys and build a snapshot.
    pub fn to_snapshot(&self) -> Result<RegistrySnapshot, RegistryError> {
        let nodes = self
            .nodes
            .iter()
            .map(|entry| {
                Ok(ConsensusNode::new(
                    entry.node_id,
                    decode_public_key(entry.node_id, &entry.public_key)?,
                    entry.stake,
                ))
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;
        RegistrySnapshot::new(nodes)
    }
}

fn decode_public_key(node_id: NodeId, text: &str) -> Result<[u8; PUBLIC_KEY_LENGTH], RegistryError> {
    let bytes = hex::decode(text.trim()).map_err(|e| RegistryError::InvalidPublicKey {
        node_id,
        reason: e.to_string(),
    })?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| RegistryError::InvalidPublicKey {
            node_id,
            reason: format!("expected {} bytes, got {}", PUBLIC_KEY_LENGTH, b.len()),
        })
}
