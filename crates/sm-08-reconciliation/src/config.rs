//! # Reconciliation Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed network-wide supply in the smallest denomination
/// (50 billion whole units of 10^8 each).
pub const DEFAULT_TOTAL_SUPPLY: u64 = 5_000_000_000_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    pub enabled: bool,
    /// Delay between runs.
    pub interval_ms: u64,
    /// Maximum snapshot pairs audited per run.
    pub window_snapshots: usize,
    /// Expected sum of every balance snapshot.
    pub total_supply: u64,
    /// Also audit token balances against token transfers.
    pub check_tokens: bool,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 60_000,
            window_snapshots: 10,
            total_supply: DEFAULT_TOTAL_SUPPLY,
            check_tokens: true,
        }
    }
}

impl ReconciliationConfig {
    pub fn for_testing() -> Self {
        Self {
            interval_ms: 10,
            window_snapshots: 4,
            total_supply: 1_000,
            ..Self::default()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err("reconciliation interval must be non-zero".to_string());
        }
        if self.window_snapshots == 0 {
            return Err("reconciliation window must cover at least one snapshot".to_string());
        }
        Ok(())
    }
}
