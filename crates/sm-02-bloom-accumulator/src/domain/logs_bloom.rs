//! Fixed-width bloom filter carried by stream records
//!
//! A record's bloom is exactly [`BLOOM_BYTES`] bytes. An empty byte string in
//! a record means "no bloom" and is modelled as `Option::None` by callers,
//! never as an all-zero filter.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BloomError;

/// Width of every bloom in bytes (2048 bits).
pub const BLOOM_BYTES: usize = 256;

type BloomBits = BitArray<[u8; BLOOM_BYTES], Lsb0>;

/// A 2048-bit bloom filter.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsBloom {
    #[serde(with = "bloom_serde")]
    bits: BloomBits,
}

/// Serde support for the fixed bit array (raw bytes, length-checked).
mod bloom_serde {
    use super::{BloomBits, BLOOM_BYTES};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bits: &BloomBits, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(bits.as_raw_slice())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BloomBits, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let data: [u8; BLOOM_BYTES] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| D::Error::invalid_length(b.len(), &"256 bloom bytes"))?;
        Ok(BloomBits::new(data))
    }
}

impl LogsBloom {
    /// Wrap raw bloom bytes.
    pub fn new(data: [u8; BLOOM_BYTES]) -> Self {
        Self {
            bits: BloomBits::new(data),
        }
    }

    /// All-zero bloom.
    pub fn zeroed() -> Self {
        Self::new([0u8; BLOOM_BYTES])
    }

    /// Parse a bloom from a record field.
    ///
    /// Returns `Ok(None)` for an empty field (absent bloom).
    pub fn from_field(bytes: &[u8]) -> Result<Option<Self>, BloomError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let data: [u8; BLOOM_BYTES] =
            bytes
                .try_into()
                .map_err(|_| BloomError::InvalidLength {
                    expected: BLOOM_BYTES,
                    actual: bytes.len(),
                })?;
        Ok(Some(Self::new(data)))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    /// Set a single bit.
    pub fn set_bit(&mut self, index: usize) {
        self.bits.set(index % (BLOOM_BYTES * 8), true);
    }

    /// Read a single bit.
    pub fn bit(&self, index: usize) -> bool {
        self.bits[index % (BLOOM_BYTES * 8)]
    }

    /// Number of set bits.
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// True when no bit is set.
    pub fn is_zero(&self) -> bool {
        self.bits.not_any()
    }

    /// OR `other` into `self` on the underlying bytes.
    pub fn or_assign(&mut self, other: &LogsBloom) {
        let self_raw = self.bits.as_raw_mut_slice();
        let other_raw = other.bits.as_raw_slice();
        for (s, o) in self_raw.iter_mut().zip(other_raw.iter()) {
            *s |= *o;
        }
    }

    /// True when every bit set in `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &LogsBloom) -> bool {
        self.bits
            .as_raw_slice()
            .iter()
            .zip(other.bits.as_raw_slice())
            .all(|(mine, theirs)| mine & theirs == *mine)
    }
}

impl fmt::Debug for LogsBloom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogsBloom({} bits set)", self.bits_set())
    }
}
