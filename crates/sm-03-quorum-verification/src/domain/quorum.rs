//! # Stake Tally
//!
//! Pure quorum arithmetic. All stake math is done in `u128` on integers:
//! `stake / total > num / den` is evaluated as `stake * den > total * num`.

use rayon::prelude::*;
use shared_types::{ConsensusTimestamp, FileHash, NodeId, StreamKind};
use sm_01_node_registry::RegistrySnapshot;
use std::collections::{HashMap, HashSet};

use super::entities::{HashTally, SignatureAssertion};
use super::errors::QuorumError;
use super::signature::verify_assertion;
use crate::config::QuorumConfig;

/// Tally output: per-hash stake plus the nodes that contributed nothing.
#[derive(Clone, Debug, Default)]
pub struct TallyOutcome {
    /// Sorted by stake descending, then hash.
    pub tallies: Vec<HashTally>,
    pub rejected_nodes: Vec<NodeId>,
}

/// Verify signatures (in parallel) and sum stake per claimed hash.
///
/// Each node counts once: its first validly signed assertion wins and later
/// ones are ignored. Unknown nodes and invalid signatures are rejected.
pub fn tally(assertions: &[SignatureAssertion], snapshot: &RegistrySnapshot) -> TallyOutcome {
    let checked: Vec<bool> = assertions
        .par_iter()
        .map(|a| {
            snapshot
                .get(a.node_id)
                .is_some_and(|node| verify_assertion(node, a))
        })
        .collect();

    let mut counted: HashSet<NodeId> = HashSet::new();
    let mut rejected_nodes = Vec::new();
    let mut by_hash: HashMap<FileHash, HashTally> = HashMap::new();

    for (assertion, valid) in assertions.iter().zip(checked) {
        if !valid {
            rejected_nodes.push(assertion.node_id);
            continue;
        }
        if !counted.insert(assertion.node_id) {
            continue;
        }
        let entry = by_hash
            .entry(assertion.claimed_hash)
            .or_insert_with(|| HashTally {
                hash: assertion.claimed_hash,
                stake: 0,
                nodes: Vec::new(),
            });
        entry.stake += snapshot.stake_of(assertion.node_id);
        entry.nodes.push(assertion.node_id);
    }

    let mut tallies: Vec<HashTally> = by_hash.into_values().collect();
    tallies.sort_by(|a, b| b.stake.cmp(&a.stake).then_with(|| a.hash.cmp(&b.hash)));

    TallyOutcome {
        tallies,
        rejected_nodes,
    }
}

/// Whether `stake` out of `total` clears the configured fraction.
pub fn clears_threshold(stake: u128, total: u128, config: &QuorumConfig) -> bool {
    if total == 0 {
        return false;
    }
    let lhs = stake.saturating_mul(config.stake_denominator as u128);
    let rhs = total.saturating_mul(config.stake_numerator as u128);
    if config.inclusive_boundary {
        lhs >= rhs
    } else {
        lhs > rhs
    }
}

/// Pick the single hash that clears the threshold.
pub fn decide(
    kind: StreamKind,
    period: ConsensusTimestamp,
    tallies: &[HashTally],
    total_stake: u128,
    config: &QuorumConfig,
) -> Result<HashTally, QuorumError> {
    let winners: Vec<&HashTally> = tallies
        .iter()
        .filter(|t| clears_threshold(t.stake, total_stake, config))
        .collect();

    match winners.as_slice() {
        [single] => Ok((*single).clone()),
        [] => Err(QuorumError::InsufficientQuorum {
            kind,
            period,
            best_stake: tallies.iter().map(|t| t.stake).max().unwrap_or(0),
            total_stake,
        }),
        many => Err(QuorumError::Conflict {
            kind,
            period,
            hashes: many.iter().map(|t| (t.hash, t.stake)).collect(),
        }),
    }
}
