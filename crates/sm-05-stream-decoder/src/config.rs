//! # Decoder Configuration

use serde::{Deserialize, Serialize};

/// Default bound on one embedded item (1 MiB).
pub const DEFAULT_MAX_ITEM_LENGTH: u32 = 1024 * 1024;

/// Decoder configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Largest accepted length prefix of an embedded item. Longer items mark
    /// the file as corrupt or hostile.
    pub max_item_length: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_item_length: DEFAULT_MAX_ITEM_LENGTH,
        }
    }
}

impl DecoderConfig {
    /// Reject a zero bound.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_item_length == 0 {
            return Err("max_item_length must be non-zero".to_string());
        }
        Ok(())
    }
}
