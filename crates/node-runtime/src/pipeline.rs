//! # Download Pipeline
//!
//! One loop per stream kind. Each cycle:
//!
//! 1. Leader guard on `download:<kind>`; followers idle.
//! 2. Read the watermark and fetch the next candidate's signatures.
//! 3. Stake-weighted quorum over the gathered assertions.
//! 4. Download bytes matching the accepted hash from a supporting node.
//! 5. Decode, then commit with the supporting assertions as audit trail.
//!    Both run on the blocking pool.
//!
//! Retryable failures end the cycle and the loop sleeps one fetch period.
//! A quorum conflict or a start-hash mismatch halts this kind's loop only.

use shared_types::{ConsensusTimestamp, ShutdownSignal, StreamKind};
use sm_01_node_registry::ConsensusNodeRegistry;
use sm_03_quorum_verification::{QuorumError, SignatureQuorumApi};
use sm_04_stream_fetcher::{FetchError, StreamFetchApi};
use sm_05_stream_decoder::{DecodeError, StreamDecodeApi};
use sm_06_leader_gate::LeaderGate;
use sm_07_batch_persister::{BatchPersistApi, BatchPersister, CommitOutcome, PersistError};
use std::sync::Arc;
use std::time::Duration;
use stream_telemetry::{
    DECODE_FAILURES, FILES_COMMITTED, LAST_COMMITTED_PERIOD, QUORUM_OUTCOMES, RECORDS_COMMITTED,
    SOURCE_FAILURES,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Lease name of the download loop for `kind`.
pub fn download_job(kind: StreamKind) -> String {
    format!("download:{}", kind)
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Quorum(#[from] QuorumError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The verified bytes describe a different period than was advertised.
    #[error("{kind} file advertised at {advertised} decodes to period {actual}")]
    PeriodMismatch {
        kind: StreamKind,
        advertised: ConsensusTimestamp,
        actual: ConsensusTimestamp,
    },

    #[error("Blocking {stage} task did not complete: {source}")]
    Task {
        stage: &'static str,
        source: tokio::task::JoinError,
    },
}

impl PipelineError {
    /// Errors that stop this kind's loop until an operator intervenes.
    pub fn is_fatal(&self) -> bool {
        match self {
            PipelineError::Quorum(e) => e.is_fatal(),
            PipelineError::Persist(PersistError::StartHashMismatch { .. }) => true,
            _ => false,
        }
    }
}

/// Result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another instance holds the lease.
    NotLeader,
    /// No source advertises anything after the watermark.
    Idle,
    /// The candidate did not gather enough stake yet.
    NoQuorum { period: ConsensusTimestamp },
    Committed {
        period: ConsensusTimestamp,
        records: usize,
    },
    /// The file was already committed by this or another instance.
    AlreadyApplied { period: ConsensusTimestamp },
}

pub struct DownloadPipeline {
    kind: StreamKind,
    fetcher: Arc<dyn StreamFetchApi>,
    verifier: Arc<dyn SignatureQuorumApi>,
    decoder: Arc<dyn StreamDecodeApi>,
    persister: Arc<BatchPersister>,
    registry: Arc<ConsensusNodeRegistry>,
    gate: Arc<LeaderGate>,
    frequency: Duration,
}

impl DownloadPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: StreamKind,
        fetcher: Arc<dyn StreamFetchApi>,
        verifier: Arc<dyn SignatureQuorumApi>,
        decoder: Arc<dyn StreamDecodeApi>,
        persister: Arc<BatchPersister>,
        registry: Arc<ConsensusNodeRegistry>,
        gate: Arc<LeaderGate>,
        frequency: Duration,
    ) -> Self {
        Self {
            kind,
            fetcher,
            verifier,
            decoder,
            persister,
            registry,
            gate,
            frequency,
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// One fetch → verify → download → decode → commit pass.
    pub async fn run_cycle(&self, shutdown: &ShutdownSignal) -> Result<CycleOutcome, PipelineError> {
        let kind = self.kind;
        if !self.gate.try_acquire(&download_job(kind)) {
            return Ok(CycleOutcome::NotLeader);
        }

        let after = self.persister.watermark(kind)?.map(|h| h.period_start);
        let snapshot = self.registry.snapshot();

        let candidate = match self
            .fetcher
            .fetch_candidate(kind, after, &snapshot, shutdown)
            .await?
        {
            Some(candidate) => candidate,
            None => return Ok(CycleOutcome::Idle),
        };
        if !candidate.failures.is_empty() {
            SOURCE_FAILURES
                .with_label_values(&[kind.as_str()])
                .inc_by(candidate.failures.len() as u64);
        }
        let period = candidate.period;

        let decision = match self
            .verifier
            .verify(kind, period, &candidate.assertions, &snapshot)
        {
            Ok(decision) => {
                QUORUM_OUTCOMES
                    .with_label_values(&[kind.as_str(), "accepted"])
                    .inc();
                decision
            }
            Err(e @ QuorumError::InsufficientQuorum { .. }) | Err(e @ QuorumError::NoAssertions { .. }) => {
                QUORUM_OUTCOMES
                    .with_label_values(&[kind.as_str(), "insufficient"])
                    .inc();
                info!(kind = %kind, period, "{}", e);
                return Ok(CycleOutcome::NoQuorum { period });
            }
            Err(e) => {
                if e.is_fatal() {
                    QUORUM_OUTCOMES
                        .with_label_values(&[kind.as_str(), "conflict"])
                        .inc();
                }
                return Err(e.into());
            }
        };

        let bytes = self
            .fetcher
            .download_verified(
                kind,
                period,
                &decision.accepted_hash,
                &decision.supporting_nodes(),
                shutdown,
            )
            .await?;

        let decoder = self.decoder.clone();
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(kind, &bytes))
            .await
            .map_err(|source| PipelineError::Task {
                stage: "decode",
                source,
            })?;
        let file = decoded.map_err(|e| {
            let reason = if e.is_unsupported() { "unsupported" } else { "structural" };
            DECODE_FAILURES
                .with_label_values(&[kind.as_str(), reason])
                .inc();
            e
        })?;
        if file.header.period_start != period {
            return Err(PipelineError::PeriodMismatch {
                kind,
                advertised: period,
                actual: file.header.period_start,
            });
        }

        let persister = self.persister.clone();
        let supporting = decision.supporting;
        let outcome = tokio::task::spawn_blocking(move || persister.commit_decoded(&file, &supporting))
            .await
            .map_err(|source| PipelineError::Task {
                stage: "commit",
                source,
            })??;
        match outcome {
            CommitOutcome::Committed { records } => {
                FILES_COMMITTED.with_label_values(&[kind.as_str()]).inc();
                RECORDS_COMMITTED
                    .with_label_values(&[kind.as_str()])
                    .inc_by(records as u64);
                LAST_COMMITTED_PERIOD
                    .with_label_values(&[kind.as_str()])
                    .set(period as f64);
                Ok(CycleOutcome::Committed { period, records })
            }
            CommitOutcome::AlreadyApplied => Ok(CycleOutcome::AlreadyApplied { period }),
        }
    }

    /// Cycle until shutdown or a fatal error. A committed file is followed
    /// immediately by the next cycle; anything else waits one period.
    pub async fn run(self: Arc<Self>, shutdown: ShutdownSignal) {
        let kind = self.kind;
        info!("[sm-04] Download loop for {} stream started", kind);

        while !shutdown.is_shutdown() {
            let pause = match self.run_cycle(&shutdown).await {
                Ok(CycleOutcome::Committed { period, records }) => {
                    info!(kind = %kind, period, records, "Committed stream file");
                    false
                }
                Ok(CycleOutcome::AlreadyApplied { period }) => {
                    debug!(kind = %kind, period, "Stream file already committed");
                    false
                }
                Ok(outcome) => {
                    debug!(kind = %kind, ?outcome, "Nothing committed this cycle");
                    true
                }
                Err(PipelineError::Fetch(FetchError::Cancelled)) => break,
                Err(e) if e.is_fatal() => {
                    error!(
                        kind = %kind,
                        "Integrity failure, halting {} ingestion until operator intervention: {}",
                        kind, e
                    );
                    self.gate.release(&download_job(kind));
                    break;
                }
                Err(e) => {
                    warn!(kind = %kind, "Cycle failed, retrying: {}", e);
                    true
                }
            };
            if pause && !shutdown.sleep(self.frequency).await {
                break;
            }
        }

        info!("[sm-04] Download loop for {} stream stopped", kind);
    }
}
