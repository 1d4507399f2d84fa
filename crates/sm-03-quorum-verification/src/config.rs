//! # Quorum Configuration
//!
//! The byzantine-safety stake fraction is a protocol policy, so it is
//! configured rather than hard-coded.

use serde::{Deserialize, Serialize};

use crate::domain::errors::QuorumError;

/// Stake threshold policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuorumConfig {
    /// Numerator of the required stake fraction.
    pub stake_numerator: u64,
    /// Denominator of the required stake fraction.
    pub stake_denominator: u64,
    /// Whether stake exactly at the fraction is accepted.
    pub inclusive_boundary: bool,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            stake_numerator: 1,
            stake_denominator: 3,
            inclusive_boundary: false,
        }
    }
}

impl QuorumConfig {
    /// Reject fractions outside `(0, 1)`.
    pub fn validate(&self) -> Result<(), QuorumError> {
        if self.stake_denominator == 0 {
            return Err(QuorumError::InvalidPolicy(
                "stake denominator must be non-zero".to_string(),
            ));
        }
        if self.stake_numerator == 0 || self.stake_numerator >= self.stake_denominator {
            return Err(QuorumError::InvalidPolicy(format!(
                "stake fraction {}/{} must lie strictly between 0 and 1",
                self.stake_numerator, self.stake_denominator
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_exclusive_one_third() {
        let config = QuorumConfig::default();
        assert_eq!((config.stake_numerator, config.stake_denominator), (1, 3));
        assert!(!config.inclusive_boundary);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_fractions() {
        for (n, d) in [(0, 3), (3, 3), (4, 3), (1, 0)] {
            let config = QuorumConfig {
                stake_numerator: n,
                stake_denominator: d,
                inclusive_boundary: false,
            };
            assert!(config.validate().is_err(), "{n}/{d} should be rejected");
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: QuorumConfig = serde_json::from_str(r#"{"inclusive_boundary":true}"#).unwrap();
        assert!(config.inclusive_boundary);
        assert_eq!(config.stake_denominator, 3);
    }
}
