//! # Test Fixtures
//!
//! A simulated network: signing nodes publishing stream files and signature
//! objects into an [`InMemorySource`], and mirror instances wired over a
//! shared [`InMemoryKVStore`] the way the binary wires them.

use ed25519_dalek::{Signer, SigningKey};
use node_runtime::{DownloadPipeline, MirrorConfig, MirrorRuntime};
use shared_types::{EntityId, FileHash, NodeId, StreamKind};
use sm_01_node_registry::{ConsensusNode, RegistrySnapshot};
use sm_04_stream_fetcher::{FetcherConfig, InMemorySource, ObjectType, SignatureFile};
use sm_05_stream_decoder::{DecodedRecord, StreamFileWriter, TransactionPayload, Transfer, VERSION_2};
use sm_07_batch_persister::{InMemoryKVStore, KeyValueStore};
use sm_08_reconciliation::ReconciliationConfig;
use std::sync::Arc;

/// Signing key of node `id`.
pub fn node_key(id: NodeId) -> SigningKey {
    SigningKey::from_bytes(&[id as u8 + 100; 32])
}

/// Nodes `1..=count`, each with `stake`.
pub fn snapshot(count: u64, stake: u64) -> RegistrySnapshot {
    let nodes = (1..=count)
        .map(|id| ConsensusNode::new(id, node_key(id).verifying_key().to_bytes(), stake))
        .collect();
    match RegistrySnapshot::new(nodes) {
        Ok(snapshot) => snapshot,
        Err(e) => panic!("fixture snapshot: {}", e),
    }
}

/// The node side of the simulation.
pub struct Network {
    pub source: Arc<InMemorySource>,
    pub nodes: u64,
}

impl Network {
    pub fn new(nodes: u64) -> Self {
        Self {
            source: Arc::new(InMemorySource::new()),
            nodes,
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        snapshot(self.nodes, 10)
    }

    /// `node` publishes `data` with a signature over `signed`.
    pub fn publish_as(&self, node: NodeId, kind: StreamKind, period: u64, data: &[u8], signed: FileHash) {
        let sig = SignatureFile {
            node_id: node,
            file_hash: signed,
            signature: node_key(node).sign(signed.as_bytes()).to_bytes(),
        };
        self.source
            .put(kind, node, period, ObjectType::Data, data.to_vec());
        self.source
            .put(kind, node, period, ObjectType::Signature, sig.encode());
    }

    /// Every listed node honestly publishes `data`.
    pub fn publish(&self, nodes: &[NodeId], kind: StreamKind, period: u64, data: &[u8]) -> FileHash {
        let hash = FileHash::digest(data);
        for &node in nodes {
            self.publish_as(node, kind, period, data, hash);
        }
        hash
    }

    /// Every node of the network publishes `data`.
    pub fn publish_all(&self, kind: StreamKind, period: u64, data: &[u8]) -> FileHash {
        let nodes: Vec<NodeId> = (1..=self.nodes).collect();
        self.publish(&nodes, kind, period, data)
    }
}

/// Encode a file of `kind` over `[start, end)`.
pub fn stream_file(
    kind: StreamKind,
    start: u64,
    end: u64,
    previous: FileHash,
    records: &[DecodedRecord],
) -> Vec<u8> {
    let mut writer = StreamFileWriter::new(kind, VERSION_2, start, end, previous);
    for record in records {
        writer.push(record);
    }
    writer.finish()
}

/// A crypto transfer of `amount` from `from` to `to` at `ts`.
pub fn transfer(ts: u64, from: u64, to: u64, amount: i64) -> DecodedRecord {
    DecodedRecord::transaction(
        ts,
        EntityId::of(from),
        TransactionPayload {
            transaction_type: 14,
            result: 22,
            fee: 0,
            transfers: vec![
                Transfer {
                    account: EntityId::of(from),
                    amount: -amount,
                },
                Transfer {
                    account: EntityId::of(to),
                    amount,
                },
            ],
            token_transfers: vec![],
            bloom: None,
        },
    )
}

/// Balance rows of one snapshot at `ts`.
pub fn balances(ts: u64, rows: &[(u64, i64)]) -> Vec<DecodedRecord> {
    rows.iter()
        .map(|&(account, balance)| DecodedRecord::balance(ts, EntityId::of(account), balance, vec![]))
        .collect()
}

/// Configuration with fast timings and a 1000-unit supply.
pub fn test_config(streams: &[StreamKind]) -> MirrorConfig {
    let mut config = MirrorConfig::default();
    config.streams = streams.to_vec();
    config.fetcher = FetcherConfig::for_testing();
    config.reconciliation = ReconciliationConfig::for_testing();
    config
}

/// One mirror instance over `store`, reading from `network`.
pub fn instance(
    network: &Network,
    store: Arc<dyn KeyValueStore>,
    config: MirrorConfig,
) -> MirrorRuntime {
    match MirrorRuntime::build_with(config, store, network.source.clone(), network.snapshot()) {
        Ok(runtime) => runtime,
        Err(e) => panic!("fixture runtime: {:#}", e),
    }
}

/// A single instance over a fresh store.
pub fn single_instance(network: &Network, streams: &[StreamKind]) -> (MirrorRuntime, Arc<InMemoryKVStore>) {
    let store = Arc::new(InMemoryKVStore::new());
    let runtime = instance(network, store.clone(), test_config(streams));
    (runtime, store)
}

/// The pipeline of `kind` in `runtime`.
pub fn pipeline(runtime: &MirrorRuntime, kind: StreamKind) -> Arc<DownloadPipeline> {
    match runtime.pipelines().iter().find(|p| p.kind() == kind) {
        Some(pipeline) => pipeline.clone(),
        None => panic!("no {} pipeline configured", kind),
    }
}
