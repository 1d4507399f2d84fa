//! # Quorum Verifier Service
//!
//! Implements [`SignatureQuorumApi`] on top of the pure tally in
//! `domain::quorum`, adding batch checks and logging.

use shared_types::{ConsensusTimestamp, StreamKind};
use sm_01_node_registry::RegistrySnapshot;
use tracing::{debug, error, info, warn};

use crate::config::QuorumConfig;
use crate::domain::entities::{QuorumDecision, SignatureAssertion};
use crate::domain::errors::QuorumError;
use crate::domain::quorum::{decide, tally};
use crate::ports::inbound::SignatureQuorumApi;

/// Stake-weighted quorum verifier.
#[derive(Clone, Debug, Default)]
pub struct QuorumVerifier {
    config: QuorumConfig,
}

impl QuorumVerifier {
    /// Create a verifier, validating the stake policy.
    pub fn new(config: QuorumConfig) -> Result<Self, QuorumError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active policy.
    pub fn config(&self) -> &QuorumConfig {
        &self.config
    }
}

impl SignatureQuorumApi for QuorumVerifier {
    fn verify(
        &self,
        kind: StreamKind,
        period: ConsensusTimestamp,
        assertions: &[SignatureAssertion],
        snapshot: &RegistrySnapshot,
    ) -> Result<QuorumDecision, QuorumError> {
        if assertions.is_empty() {
            return Err(QuorumError::NoAssertions { kind, period });
        }
        if assertions
            .iter()
            .any(|a| a.kind != kind || a.period != period)
        {
            return Err(QuorumError::MixedBatch { kind, period });
        }

        let outcome = tally(assertions, snapshot);
        if !outcome.rejected_nodes.is_empty() {
            warn!(
                "[sm-03] {} file at {}: ignored assertions from nodes {:?} (unknown node or bad signature)",
                kind, period, outcome.rejected_nodes
            );
        }

        let total_stake = snapshot.total_stake();
        let winner = match decide(kind, period, &outcome.tallies, total_stake, &self.config) {
            Ok(winner) => winner,
            Err(e) if e.is_fatal() => {
                error!("[sm-03] {}", e);
                return Err(e);
            }
            Err(e) => {
                debug!("[sm-03] {}", e);
                return Err(e);
            }
        };

        let supporting: Vec<SignatureAssertion> = {
            let mut seen = Vec::with_capacity(winner.nodes.len());
            assertions
                .iter()
                .filter(|a| a.claimed_hash == winner.hash && winner.nodes.contains(&a.node_id))
                .filter(|a| {
                    if seen.contains(&a.node_id) {
                        false
                    } else {
                        seen.push(a.node_id);
                        true
                    }
                })
                .cloned()
                .collect()
        };
        let discarded = outcome
            .tallies
            .into_iter()
            .filter(|t| t.hash != winner.hash)
            .collect::<Vec<_>>();

        info!(
            "[sm-03] {} file at {} accepted: hash {} with stake {}/{} from {} nodes",
            kind,
            period,
            winner.hash.short(),
            winner.stake,
            total_stake,
            supporting.len()
        );

        Ok(QuorumDecision {
            kind,
            period,
            accepted_hash: winner.hash,
            supporting_stake: winner.stake,
            total_stake,
            supporting,
            discarded,
            rejected_nodes: outcome.rejected_nodes,
        })
    }
}
