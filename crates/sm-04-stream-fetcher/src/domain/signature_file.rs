//! # Signature Object Codec
//!
//! ```text
//! u32 version (1) | u64 node id | [48] file hash | u32 sig length (64) | sig
//! ```
//!
//! All integers big-endian.

use shared_types::{ConsensusTimestamp, FileHash, NodeId, StreamKind, HASH_LENGTH};
use sm_03_quorum_verification::{SignatureAssertion, SIGNATURE_LENGTH};

use crate::ports::outbound::SourceError;

/// Only supported signature object version.
pub const SIGNATURE_FILE_VERSION: u32 = 1;

const ENCODED_LENGTH: usize = 4 + 8 + HASH_LENGTH + 4 + SIGNATURE_LENGTH;

/// A decoded signature object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFile {
    pub node_id: NodeId,
    pub file_hash: FileHash,
    pub signature: [u8; SIGNATURE_LENGTH],
}

impl SignatureFile {
    /// Canonical encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCODED_LENGTH);
        out.extend_from_slice(&SIGNATURE_FILE_VERSION.to_be_bytes());
        out.extend_from_slice(&self.node_id.to_be_bytes());
        out.extend_from_slice(self.file_hash.as_bytes());
        out.extend_from_slice(&(SIGNATURE_LENGTH as u32).to_be_bytes());
        out.extend_from_slice(&self.signature);
        out
    }

    /// Strict decoding: exact length, known version, 64-byte signature.
    pub fn decode(bytes: &[u8]) -> Result<Self, SourceError> {
        if bytes.len() != ENCODED_LENGTH {
            return Err(SourceError::Malformed(format!(
                "signature object is {} bytes, expected {}",
                bytes.len(),
                ENCODED_LENGTH
            )));
        }
        let version = u32::from_be_bytes(read_array(bytes, 0)?);
        if version != SIGNATURE_FILE_VERSION {
            return Err(SourceError::Malformed(format!(
                "unsupported signature object version {version}"
            )));
        }
        let node_id = u64::from_be_bytes(read_array(bytes, 4)?);
        let file_hash = FileHash(read_array(bytes, 12)?);
        let sig_len = u32::from_be_bytes(read_array(bytes, 12 + HASH_LENGTH)?);
        if sig_len as usize != SIGNATURE_LENGTH {
            return Err(SourceError::Malformed(format!(
                "signature length {sig_len}, expected {SIGNATURE_LENGTH}"
            )));
        }
        let signature = read_array(bytes, 16 + HASH_LENGTH)?;
        Ok(Self {
            node_id,
            file_hash,
            signature,
        })
    }

    /// Turn the object into a quorum input for `kind`/`period`.
    pub fn into_assertion(self, kind: StreamKind, period: ConsensusTimestamp) -> SignatureAssertion {
        SignatureAssertion {
            node_id: self.node_id,
            kind,
            period,
            claimed_hash: self.file_hash,
            signature: self.signature,
        }
    }
}

fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N], SourceError> {
    bytes
        .get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| SourceError::Malformed(format!("truncated at offset {offset}")))
}
