//! # Mirror Runtime
//!
//! Wires every component from a [`MirrorConfig`]:
//!
//! ```text
//! KeyValueStore ─┬─ BatchPersister ── DownloadPipeline (one per kind)
//!                ├─ KvLeaseStore ──── LeaderGate (shared)
//!                └─ KvRunStore ────── ReconciliationEngine
//! StreamSource ──── StreamFileFetcher
//! AddressBook ───── ConsensusNodeRegistry
//! ```

use anyhow::{Context, Result};
use shared_types::ShutdownSignal;
use sm_01_node_registry::{AddressBook, ConsensusNodeRegistry, RegistrySnapshot};
use sm_03_quorum_verification::QuorumVerifier;
use sm_04_stream_fetcher::{FsBucketSource, StreamFileFetcher, StreamSource};
use sm_05_stream_decoder::StreamFileDecoder;
use sm_06_leader_gate::LeaderGate;
use sm_07_batch_persister::{BatchPersister, InMemoryKVStore, KeyValueStore, KvLeaseStore};
use sm_08_reconciliation::{KvRunStore, ReconciliationEngine};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{MirrorConfig, StorageBackend};
use crate::pipeline::DownloadPipeline;
use crate::reconcile::run_reconciliation;

pub struct MirrorRuntime {
    config: MirrorConfig,
    store: Arc<dyn KeyValueStore>,
    persister: Arc<BatchPersister>,
    gate: Arc<LeaderGate>,
    pipelines: Vec<Arc<DownloadPipeline>>,
    reconciliation: Arc<ReconciliationEngine>,
}

impl MirrorRuntime {
    /// Open configured storage, load the address book and read from the
    /// bucket tree under `bucket_root`.
    pub fn build(config: MirrorConfig) -> Result<Self> {
        let book = AddressBook::load(&config.address_book)
            .with_context(|| format!("loading address book {}", config.address_book.display()))?;
        let snapshot = book.to_snapshot().context("building registry snapshot")?;
        let store = open_store(&config)?;
        let source = Arc::new(FsBucketSource::new(config.bucket_root.clone()));
        Self::build_with(config, store, source, snapshot)
    }

    /// Wire the components over caller-supplied storage, source and nodes.
    pub fn build_with(
        config: MirrorConfig,
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn StreamSource>,
        snapshot: RegistrySnapshot,
    ) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let registry = Arc::new(ConsensusNodeRegistry::new(snapshot));
        let gate = Arc::new(LeaderGate::new(
            Arc::new(KvLeaseStore::new(store.clone())),
            &config.leader,
        ));

        let mut persister = BatchPersister::new(store.clone());
        for (kind, hash) in config.start_hashes()? {
            persister = persister.with_start_hash(kind, hash);
        }
        let persister = Arc::new(persister);

        let fetcher = Arc::new(
            StreamFileFetcher::new(source, config.fetcher.clone()).with_quorum(config.quorum.clone()),
        );
        let verifier = Arc::new(QuorumVerifier::new(config.quorum.clone())?);
        let decoder = Arc::new(StreamFileDecoder::new(config.decoder.clone()));

        let pipelines = config
            .streams
            .iter()
            .map(|&kind| {
                Arc::new(DownloadPipeline::new(
                    kind,
                    fetcher.clone(),
                    verifier.clone(),
                    decoder.clone(),
                    persister.clone(),
                    registry.clone(),
                    gate.clone(),
                    config.fetcher.frequency(),
                ))
            })
            .collect();

        let reconciliation = Arc::new(ReconciliationEngine::new(
            persister.clone(),
            Arc::new(KvRunStore::new(store.clone())),
            gate.clone(),
            config.reconciliation.clone(),
        )?);

        info!(
            "Runtime wired: {} node(s), streams {:?}, storage {:?}",
            registry.snapshot().len(),
            config.streams,
            config.storage
        );

        Ok(Self {
            config,
            store,
            persister,
            gate,
            pipelines,
            reconciliation,
        })
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn persister(&self) -> &Arc<BatchPersister> {
        &self.persister
    }

    pub fn gate(&self) -> &Arc<LeaderGate> {
        &self.gate
    }

    pub fn pipelines(&self) -> &[Arc<DownloadPipeline>] {
        &self.pipelines
    }

    pub fn reconciliation(&self) -> &Arc<ReconciliationEngine> {
        &self.reconciliation
    }

    /// Start one download loop per configured kind plus the reconciliation
    /// loop when enabled.
    pub fn spawn(&self, shutdown: &ShutdownSignal) -> Vec<JoinHandle<()>> {
        let mut handles: Vec<JoinHandle<()>> = self
            .pipelines
            .iter()
            .map(|pipeline| tokio::spawn(pipeline.clone().run(shutdown.clone())))
            .collect();

        if self.config.reconciliation.enabled {
            handles.push(tokio::spawn(run_reconciliation(
                self.reconciliation.clone(),
                self.config.reconciliation.interval(),
                shutdown.clone(),
            )));
        }
        handles
    }
}

fn open_store(config: &MirrorConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.storage {
        StorageBackend::Memory => Ok(Arc::new(InMemoryKVStore::new())),
        StorageBackend::Rocksdb => open_rocksdb(config),
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(config: &MirrorConfig) -> Result<Arc<dyn KeyValueStore>> {
    use crate::adapters::storage::{RocksDbConfig, RocksDbStore};

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;
    let store = RocksDbStore::open(RocksDbConfig {
        path: config.data_dir.join("rocksdb"),
        ..Default::default()
    })
    .context("opening RocksDB")?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(_config: &MirrorConfig) -> Result<Arc<dyn KeyValueStore>> {
    anyhow::bail!("storage backend 'rocksdb' requires building with the `rocksdb` feature")
}
