//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Streams**: `StreamKind`, `StreamFileHeader`
//! - **Digests**: `FileHash` (SHA-384)
//! - **Identity**: `EntityId`, `NodeId`
//! - **Time**: `ConsensusTimestamp`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha384};
use std::fmt;
use std::str::FromStr;

use crate::errors::ParseError;

/// Length in bytes of every stream digest (SHA-384).
pub const HASH_LENGTH: usize = 48;

/// Nanoseconds since the Unix epoch, as assigned by network consensus.
pub type ConsensusTimestamp = u64;

/// Numeric identifier of a consensus node (the `num` part of its account).
pub type NodeId = u64;

// =============================================================================
// DIGESTS
// =============================================================================

/// A 48-byte SHA-384 digest of canonical stream file bytes.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileHash(#[serde_as(as = "Bytes")] pub [u8; HASH_LENGTH]);

impl FileHash {
    /// The all-zero digest, used as the predecessor of the first file in a stream.
    pub const ZERO: FileHash = FileHash([0u8; HASH_LENGTH]);

    /// Hash arbitrary bytes with SHA-384.
    pub fn digest(data: &[u8]) -> Self {
        Self::digest_parts(&[data])
    }

    /// Hash the concatenation of several byte slices without copying them.
    pub fn digest_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha384::new();
        for part in parts {
            hasher.update(part);
        }
        let result = hasher.finalize();
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(&result);
        FileHash(out)
    }

    /// Build a digest from a slice of exactly `HASH_LENGTH` bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() != HASH_LENGTH {
            return Err(ParseError::InvalidHashLength {
                expected: HASH_LENGTH,
                actual: bytes.len(),
            });
        }
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(bytes);
        Ok(FileHash(out))
    }

    /// Parse a hex-encoded digest.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let bytes = hex::decode(s.trim()).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Full lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// True for the all-zero digest.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl Default for FileHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileHash({}…)", self.short())
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// =============================================================================
// STREAM KINDS
// =============================================================================

/// The closed set of append-only ledger exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Transaction records with their transfers.
    Transaction,
    /// Periodic account balance snapshots.
    Balance,
    /// Consensus event records.
    Event,
}

impl StreamKind {
    /// Every stream kind, in tag order.
    pub const ALL: [StreamKind; 3] = [StreamKind::Transaction, StreamKind::Balance, StreamKind::Event];

    /// Single-byte tag written into file headers.
    pub fn tag(self) -> u8 {
        match self {
            StreamKind::Transaction => 1,
            StreamKind::Balance => 2,
            StreamKind::Event => 3,
        }
    }

    /// Inverse of [`StreamKind::tag`].
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(StreamKind::Transaction),
            2 => Some(StreamKind::Balance),
            3 => Some(StreamKind::Event),
            _ => None,
        }
    }

    /// Stable lowercase name, used in object paths, storage keys and config.
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Transaction => "transaction",
            StreamKind::Balance => "balance",
            StreamKind::Event => "event",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transaction" | "record" => Ok(StreamKind::Transaction),
            "balance" => Ok(StreamKind::Balance),
            "event" => Ok(StreamKind::Event),
            other => Err(ParseError::UnknownStreamKind(other.to_string())),
        }
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// A scoped ledger entity identifier (`shard.realm.num`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl EntityId {
    /// Create a new entity id.
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// Entity in shard 0, realm 0.
    pub const fn of(num: u64) -> Self {
        Self::new(0, 0, num)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(ParseError::InvalidEntityId(s.to_string()));
        }
        let parse = |p: &str| {
            p.parse::<u64>()
                .map_err(|_| ParseError::InvalidEntityId(s.to_string()))
        };
        Ok(Self::new(parse(parts[0])?, parse(parts[1])?, parse(parts[2])?))
    }
}

// =============================================================================
// STREAM FILES
// =============================================================================

/// Header of one period-bounded, authenticated stream file.
///
/// Created by the decoder only after authentication and structural validation;
/// immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFileHeader {
    /// Which stream this file belongs to.
    pub kind: StreamKind,
    /// Binary format version the file was written with.
    pub version: u32,
    /// Inclusive start of the covered period (ns).
    pub period_start: ConsensusTimestamp,
    /// Exclusive end of the covered period (ns).
    pub period_end: ConsensusTimestamp,
    /// SHA-384 of the canonical file bytes.
    pub content_hash: FileHash,
    /// Claimed content hash of the immediately preceding file of the same kind.
    pub previous_hash: FileHash,
    /// Number of items the file declares (and contains).
    pub item_count: u32,
    /// Size of the raw file in bytes.
    pub raw_size: u64,
}

impl StreamFileHeader {
    /// Chain continuity: `self` may directly follow `previous`.
    pub fn follows(&self, previous: &StreamFileHeader) -> bool {
        self.kind == previous.kind
            && self.previous_hash == previous.content_hash
            && self.period_start > previous.period_start
    }

    /// True when `ts` falls in the half-open period of this file.
    pub fn covers(&self, ts: ConsensusTimestamp) -> bool {
        ts >= self.period_start && ts < self.period_end
    }
}
