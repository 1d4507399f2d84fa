//! Registry domain entities
//!
//! A [`RegistrySnapshot`] is built once from a list of nodes and never
//! mutated afterwards; the total network stake is computed at construction.

use serde::{Deserialize, Serialize};
use shared_types::NodeId;
use std::collections::HashMap;

use super::errors::RegistryError;

/// Length of an ed25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// An active network node able to sign stream files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusNode {
    pub node_id: NodeId,
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
    pub stake: u64,
}

impl ConsensusNode {
    /// Create a new node entry.
    pub fn new(node_id: NodeId, public_key: [u8; PUBLIC_KEY_LENGTH], stake: u64) -> Self {
        Self {
            node_id,
            public_key,
            stake,
        }
    }
}

/// Immutable view of the signing nodes at one point in time.
#[derive(Clone, Debug)]
pub struct RegistrySnapshot {
    nodes: Vec<ConsensusNode>,
    total_stake: u128,
    /// Whether all nodes reported zero stake and each was given weight 1.
    equal_weight: bool,
    lookup: HashMap<NodeId, usize>,
}

impl RegistrySnapshot {
    /// Build a snapshot, rejecting empty and duplicate node sets.
    ///
    /// When every node reports zero stake (an address book without stake
    /// data), each node counts with weight 1 so quorum degrades to a node count.
    pub fn new(mut nodes: Vec<ConsensusNode>) -> Result<Self, RegistryError> {
        if nodes.is_empty() {
            return Err(RegistryError::Empty);
        }
        nodes.sort_by_key(|n| n.node_id);

        let mut lookup = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if lookup.insert(node.node_id, idx).is_some() {
                return Err(RegistryError::DuplicateNode(node.node_id));
            }
        }

        let staked: u128 = nodes.iter().map(|n| n.stake as u128).sum();
        let equal_weight = staked == 0;
        let total_stake = if equal_weight {
            nodes.len() as u128
        } else {
            staked
        };

        Ok(Self {
            nodes,
            total_stake,
            equal_weight,
            lookup,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a constructed snapshot; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, ordered by node id.
    pub fn nodes(&self) -> &[ConsensusNode] {
        &self.nodes
    }

    /// Node ids, ordered.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.node_id)
    }

    /// Look up a node.
    pub fn get(&self, node_id: NodeId) -> Option<&ConsensusNode> {
        self.lookup.get(&node_id).map(|&idx| &self.nodes[idx])
    }

    /// Effective stake weight of a node (0 for unknown nodes).
    pub fn stake_of(&self, node_id: NodeId) -> u128 {
        match self.get(node_id) {
            Some(_) if self.equal_weight => 1,
            Some(node) => node.stake as u128,
            None => 0,
        }
    }

    /// Total network stake shared by every node of this snapshot.
    pub fn total_stake(&self) -> u128 {
        self.total_stake
    }

    /// True when stake data was absent and nodes are weighted equally.
    pub fn is_equal_weight(&self) -> bool {
        self.equal_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: NodeId, stake: u64) -> ConsensusNode {
        ConsensusNode::new(id, [id as u8; PUBLIC_KEY_LENGTH], stake)
    }

    #[test]
    fn test_snapshot_totals_stake() {
        let snapshot = RegistrySnapshot::new(vec![node(3, 40), node(4, 35), node(5, 25)]).unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.total_stake(), 100);
        assert_eq!(snapshot.stake_of(4), 35);
        assert_eq!(snapshot.stake_of(99), 0);
        assert!(!snapshot.is_equal_weight());
    }

    #[test]
    fn test_snapshot_orders_nodes() {
        let snapshot = RegistrySnapshot::new(vec![node(7, 1), node(2, 1)]).unwrap();
        let ids: Vec<_> = snapshot.node_ids().collect();
        assert_eq!(ids, vec![2, 7]);
        assert_eq!(snapshot.get(7).unwrap().stake, 1);
    }

    #[test]
    fn test_zero_stake_falls_back_to_equal_weight() {
        let snapshot = RegistrySnapshot::new(vec![node(1, 0), node(2, 0), node(3, 0)]).unwrap();
        assert!(snapshot.is_equal_weight());
        assert_eq!(snapshot.total_stake(), 3);
        assert_eq!(snapshot.stake_of(2), 1);
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert_eq!(RegistrySnapshot::new(vec![]).unwrap_err(), RegistryError::Empty);
        assert_eq!(
            RegistrySnapshot::new(vec![node(1, 5), node(1, 6)]).unwrap_err(),
            RegistryError::DuplicateNode(1)
        );
    }

    #[test]
    fn test_large_stakes_do_not_overflow() {
        let snapshot =
            RegistrySnapshot::new(vec![node(1, u64::MAX), node(2, u64::MAX)]).unwrap();
        assert_eq!(snapshot.total_stake(), 2 * u64::MAX as u128);
    }
}
