//! # Fetcher Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::errors::FetchError;

/// Stream file fetcher configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Maximum number of sources queried at once.
    pub concurrency: usize,

    /// Per-request timeout in milliseconds. A timeout excludes the source
    /// for the round.
    pub request_timeout_ms: u64,

    /// First backoff delay after a source failure.
    pub backoff_min_ms: u64,

    /// Cap on the backoff delay.
    pub backoff_max_ms: u64,

    /// Delay between download rounds when nothing new was found.
    pub frequency_ms: u64,

    /// Periods requested from each node's listing per round.
    pub listing_depth: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency: 16,
            request_timeout_ms: 5_000,
            backoff_min_ms: 500,
            backoff_max_ms: 60_000,
            frequency_ms: 1_000,
            listing_depth: 8,
        }
    }
}

impl FetcherConfig {
    /// Fast settings for tests.
    pub fn for_testing() -> Self {
        Self {
            concurrency: 4,
            request_timeout_ms: 200,
            backoff_min_ms: 10,
            backoff_max_ms: 100,
            frequency_ms: 10,
            listing_depth: 4,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn backoff_min(&self) -> Duration {
        Duration::from_millis(self.backoff_min_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    pub fn frequency(&self) -> Duration {
        Duration::from_millis(self.frequency_ms)
    }

    /// Reject unusable settings.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.concurrency == 0 {
            return Err(FetchError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.listing_depth == 0 {
            return Err(FetchError::InvalidConfig(
                "listing depth must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(FetchError::InvalidConfig(
                "request timeout must be non-zero".to_string(),
            ));
        }
        if self.backoff_min_ms > self.backoff_max_ms {
            return Err(FetchError::InvalidConfig(format!(
                "backoff min {}ms exceeds max {}ms",
                self.backoff_min_ms, self.backoff_max_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(FetcherConfig::default().validate().is_ok());
        assert!(FetcherConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_backoff_bounds_checked() {
        let config = FetcherConfig {
            backoff_min_ms: 10,
            backoff_max_ms: 5,
            ..FetcherConfig::default()
        };
        assert!(matches!(config.validate(), Err(FetchError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = FetcherConfig {
            concurrency: 0,
            ..FetcherConfig::default()
        };
        assert!(config.validate().is_err());

        let config = FetcherConfig {
            listing_depth: 0,
            ..FetcherConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
