//! # Leader Gate Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lease settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderConfig {
    /// Lease window. A holder that does not renew within it loses the job.
    pub lease_ttl_ms: u64,
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            lease_ttl_ms: 30_000,
        }
    }
}

impl LeaderConfig {
    pub fn lease_ttl(&self) -> Duration {
        Duration::from_millis(self.lease_ttl_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.lease_ttl_ms == 0 {
            return Err("lease window must be non-zero".to_string());
        }
        Ok(())
    }
}
