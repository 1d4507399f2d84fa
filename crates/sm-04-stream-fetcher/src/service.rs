//! # Stream File Fetcher Service
//!
//! Every source request is bounded by the request timeout and raced against
//! shutdown. Sources are queried with at most `concurrency` requests in
//! flight.
//!
//! The candidate period is the earliest one whose advertising nodes hold
//! enough stake to possibly reach quorum. A period only low-stake nodes
//! advertise cannot shadow the period the rest of the network has published.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use shared_types::{
    ConsensusTimestamp, FileHash, NodeId, ShutdownSignal, StreamKind, SystemTimeSource,
    TimeSource,
};
use sm_01_node_registry::RegistrySnapshot;
use sm_03_quorum_verification::{clears_threshold, QuorumConfig, SignatureAssertion};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::FetcherConfig;
use crate::domain::backoff::SourceHealth;
use crate::domain::entities::{CandidateFile, ObjectType, SourceFailure};
use crate::domain::errors::FetchError;
use crate::domain::signature_file::SignatureFile;
use crate::ports::inbound::StreamFetchApi;
use crate::ports::outbound::{SourceError, StreamSource};

/// Multi-source stream file fetcher.
pub struct StreamFileFetcher {
    source: Arc<dyn StreamSource>,
    health: SourceHealth,
    config: FetcherConfig,
    quorum: QuorumConfig,
}

impl StreamFileFetcher {
    /// Create a fetcher on the system clock.
    pub fn new(source: Arc<dyn StreamSource>, config: FetcherConfig) -> Self {
        Self::with_clock(source, config, Arc::new(SystemTimeSource))
    }

    /// Create a fetcher with an explicit clock driving source backoff.
    pub fn with_clock(
        source: Arc<dyn StreamSource>,
        config: FetcherConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let health = SourceHealth::new(config.backoff_min(), config.backoff_max(), clock);
        Self {
            source,
            health,
            config,
            quorum: QuorumConfig::default(),
        }
    }

    /// Stake policy used to rank advertised periods.
    pub fn with_quorum(mut self, quorum: QuorumConfig) -> Self {
        self.quorum = quorum;
        self
    }

    pub fn health(&self) -> &SourceHealth {
        &self.health
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Run `request` against every node with bounded concurrency.
    async fn fan_out<T, F, Fut>(
        &self,
        nodes: Vec<NodeId>,
        shutdown: &ShutdownSignal,
        request: F,
    ) -> Result<Vec<(NodeId, Result<T, SourceError>)>, FetchError>
    where
        F: Fn(Arc<dyn StreamSource>, NodeId) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let timeout = self.config.request_timeout();
        let requests = stream::iter(nodes)
            .map(|node| {
                let call = request(self.source.clone(), node);
                async move { (node, bounded(timeout, call).await) }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect::<Vec<_>>();
        shutdown.run_until(requests).await.ok_or(FetchError::Cancelled)
    }

    /// Earliest period whose advertisers could clear the stake threshold,
    /// falling back to the earliest period when none can yet.
    fn select_period(
        &self,
        kind: StreamKind,
        mut advertised: BTreeMap<ConsensusTimestamp, Vec<NodeId>>,
        snapshot: &RegistrySnapshot,
    ) -> Option<(ConsensusTimestamp, Vec<NodeId>)> {
        let total = snapshot.total_stake();
        let earliest = advertised.keys().next().copied()?;
        let backed = advertised
            .iter()
            .find(|(_, nodes)| {
                let stake: u128 = nodes.iter().map(|n| snapshot.stake_of(*n)).sum();
                clears_threshold(stake, total, &self.quorum)
            })
            .map(|(period, _)| *period);

        let period = match backed {
            Some(period) if period != earliest => {
                warn!(
                    "[sm-04] Skipping {} period {} advertised without quorum stake; candidate is {}",
                    kind, earliest, period
                );
                period
            }
            _ => earliest,
        };
        advertised.remove(&period).map(|nodes| (period, nodes))
    }

    fn exclude(
        &self,
        kind: StreamKind,
        node_id: NodeId,
        reason: String,
        failures: &mut Vec<SourceFailure>,
    ) {
        let delay = self.health.record_failure(kind, node_id);
        warn!(
            "[sm-04] {} source node {} excluded for this round: {} (retry in {:?})",
            kind, node_id, reason, delay
        );
        failures.push(SourceFailure { node_id, reason });
    }
}

async fn bounded<T, Fut>(timeout: Duration, call: Fut) -> Result<T, SourceError>
where
    Fut: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout),
    }
}

#[async_trait]
impl StreamFetchApi for StreamFileFetcher {
    async fn fetch_candidate(
        &self,
        kind: StreamKind,
        after: Option<ConsensusTimestamp>,
        snapshot: &RegistrySnapshot,
        shutdown: &ShutdownSignal,
    ) -> Result<Option<CandidateFile>, FetchError> {
        if shutdown.is_shutdown() {
            return Err(FetchError::Cancelled);
        }

        let nodes: Vec<NodeId> = snapshot
            .node_ids()
            .filter(|node| self.health.is_available(kind, *node))
            .collect();
        if nodes.is_empty() {
            return Err(FetchError::NoResponsiveSources { kind });
        }

        let mut failures = Vec::new();

        // Discovery: the next few advertised periods per node.
        let depth = self.config.listing_depth.max(1);
        let listings = self
            .fan_out(nodes, shutdown, |source, node| async move {
                source.list_periods(kind, node, after, depth).await
            })
            .await?;

        let mut advertised: BTreeMap<ConsensusTimestamp, Vec<NodeId>> = BTreeMap::new();
        let mut responsive = 0usize;
        for (node, listing) in listings {
            match listing {
                Ok(periods) => {
                    responsive += 1;
                    self.health.record_success(kind, node);
                    for period in periods.into_iter().take(depth) {
                        advertised.entry(period).or_default().push(node);
                    }
                }
                Err(e) => self.exclude(kind, node, e.to_string(), &mut failures),
            }
        }
        if responsive == 0 {
            return Err(FetchError::NoResponsiveSources { kind });
        }
        let Some((period, mut holders)) = self.select_period(kind, advertised, snapshot) else {
            debug!("[sm-04] No new {} files after {:?}", kind, after);
            return Ok(None);
        };
        holders.sort_unstable();
        let queried = holders.len();

        // Gather signature objects for the candidate period.
        let objects = self
            .fan_out(holders, shutdown, |source, node| async move {
                source.get(kind, period, node, ObjectType::Signature).await
            })
            .await?;

        let mut assertions: Vec<SignatureAssertion> = Vec::with_capacity(objects.len());
        for (node, object) in objects {
            let parsed = match object {
                Ok(Some(bytes)) => SignatureFile::decode(&bytes),
                Ok(None) => Err(SourceError::Unavailable(
                    "signature object not found".to_string(),
                )),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(file) if file.node_id == node => {
                    self.health.record_success(kind, node);
                    assertions.push(file.into_assertion(kind, period));
                }
                Ok(file) => self.exclude(
                    kind,
                    node,
                    format!("signature object names node {}", file.node_id),
                    &mut failures,
                ),
                Err(e) => self.exclude(kind, node, e.to_string(), &mut failures),
            }
        }
        assertions.sort_by_key(|a| a.node_id);

        info!(
            "[sm-04] {} candidate at {}: {} of {} sources returned signatures",
            kind,
            period,
            assertions.len(),
            queried
        );

        Ok(Some(CandidateFile {
            kind,
            period,
            assertions,
            queried,
            failures,
        }))
    }

    async fn download_verified(
        &self,
        kind: StreamKind,
        period: ConsensusTimestamp,
        expected: &FileHash,
        nodes: &[NodeId],
        shutdown: &ShutdownSignal,
    ) -> Result<Vec<u8>, FetchError> {
        let timeout = self.config.request_timeout();
        for &node in nodes {
            let call = bounded(timeout, self.source.get(kind, period, node, ObjectType::Data));
            let result = shutdown.run_until(call).await.ok_or(FetchError::Cancelled)?;
            let reason = match result {
                Ok(Some(bytes)) => {
                    let actual = FileHash::digest(&bytes);
                    if actual == *expected {
                        self.health.record_success(kind, node);
                        debug!(
                            "[sm-04] Downloaded {} file at {} ({} bytes) from node {}",
                            kind,
                            period,
                            bytes.len(),
                            node
                        );
                        return Ok(bytes);
                    }
                    format!("data hash {} does not match accepted {}", actual.short(), expected.short())
                }
                Ok(None) => "data object not found".to_string(),
                Err(e) => e.to_string(),
            };
            let mut ignored = Vec::new();
            self.exclude(kind, node, reason, &mut ignored);
        }
        Err(FetchError::NoVerifiedData {
            kind,
            period,
            tried: nodes.len(),
        })
    }
}
