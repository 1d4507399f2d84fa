//! # Reconciliation Engine Service
//!
//! One run:
//!
//! 1. Leader guard: without the `reconciliation` lease, do nothing.
//! 2. Window: from the end of the last terminal run (or the first snapshot)
//!    over at most `window_snapshots` later snapshots, limited to snapshots
//!    whose transfers are fully committed.
//! 3. Record the run as running, audit every consecutive snapshot pair, then
//!    record the terminal status. A failing pair does not stop the audit:
//!    each violation lands in `findings` and the first becomes the status.

use shared_types::{ConsensusTimestamp, StreamKind, SystemTimeSource, TimeSource};
use sm_06_leader_gate::LeaderGate;
use sm_07_batch_persister::{LedgerReader, PersistError};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ReconciliationConfig;
use crate::domain::checks::{check_supply, check_token_transfers, check_transfers};
use crate::domain::entities::{ReconciliationRun, ReconciliationStatus};
use crate::domain::errors::ReconciliationError;
use crate::domain::report::{describe, describe_findings};
use crate::ports::inbound::ReconciliationApi;
use crate::ports::outbound::RunStore;

/// Lease name of the reconciliation job.
pub const RECONCILIATION_JOB: &str = "reconciliation";

pub struct ReconciliationEngine {
    ledger: Arc<dyn LedgerReader>,
    runs: Arc<dyn RunStore>,
    gate: Arc<LeaderGate>,
    config: ReconciliationConfig,
    clock: Arc<dyn TimeSource>,
}

/// Snapshots audited by one run: `first` then each of `rest` in order.
struct Window {
    first: ConsensusTimestamp,
    rest: Vec<ConsensusTimestamp>,
    /// No earlier run covered `first`, so its supply is checked too.
    fresh: bool,
}

impl ReconciliationEngine {
    pub fn new(
        ledger: Arc<dyn LedgerReader>,
        runs: Arc<dyn RunStore>,
        gate: Arc<LeaderGate>,
        config: ReconciliationConfig,
    ) -> Result<Self, ReconciliationError> {
        Self::with_clock(ledger, runs, gate, config, Arc::new(SystemTimeSource))
    }

    pub fn with_clock(
        ledger: Arc<dyn LedgerReader>,
        runs: Arc<dyn RunStore>,
        gate: Arc<LeaderGate>,
        config: ReconciliationConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ReconciliationError> {
        config.validate().map_err(ReconciliationError::InvalidConfig)?;
        Ok(Self {
            ledger,
            runs,
            gate,
            config,
            clock,
        })
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    fn next_window(&self) -> Result<Option<Window>, ReconciliationError> {
        let (first, fresh) = match self.runs.latest()? {
            Some(run) if run.status.is_terminal() => (run.window_end, false),
            // Interrupted before finishing: audit the same window again.
            Some(run) => (run.window_start, self.runs.all()?.len() == 1),
            None => match self.ledger.balance_snapshots(None, 1)?.first() {
                Some(ts) => (*ts, true),
                None => return Ok(None),
            },
        };

        let Some(covered) = self.ledger.committed_through(StreamKind::Transaction)? else {
            return Ok(None);
        };
        let rest: Vec<_> = self
            .ledger
            .balance_snapshots(Some(first), self.config.window_snapshots)?
            .into_iter()
            .take_while(|ts| *ts < covered)
            .collect();
        if rest.is_empty() {
            return Ok(None);
        }
        Ok(Some(Window { first, rest, fresh }))
    }

    fn audit(
        &self,
        window: &Window,
        items: &mut u64,
        findings: &mut Vec<ReconciliationStatus>,
    ) -> Result<(), PersistError> {
        let supply = i128::from(self.config.total_supply);
        let mut start_ts = window.first;
        let mut start = self.ledger.account_balances(start_ts)?;
        *items += start.len() as u64;
        if window.fresh {
            findings.extend(check_supply(start_ts, &start, supply));
        }

        for &end_ts in &window.rest {
            let end = self.ledger.account_balances(end_ts)?;
            let transfers = self.ledger.crypto_transfers(start_ts, end_ts)?;
            *items += (end.len() + transfers.len()) as u64;

            findings.extend(check_supply(end_ts, &end, supply));
            findings.extend(check_transfers(start_ts, end_ts, &start, &end, &transfers));
            if self.config.check_tokens {
                let token_start = self.ledger.token_balances(start_ts)?;
                let token_end = self.ledger.token_balances(end_ts)?;
                let token_transfers = self.ledger.token_transfers(start_ts, end_ts)?;
                *items += token_transfers.len() as u64;
                findings.extend(check_token_transfers(
                    start_ts,
                    end_ts,
                    &token_start,
                    &token_end,
                    &token_transfers,
                ));
            }

            start_ts = end_ts;
            start = end;
        }
        Ok(())
    }
}

impl ReconciliationApi for ReconciliationEngine {
    fn run_once(&self) -> Result<Option<ReconciliationRun>, ReconciliationError> {
        if !self.gate.try_acquire(RECONCILIATION_JOB) {
            debug!("[sm-08] Not the reconciliation leader, skipping");
            return Ok(None);
        }

        let Some(window) = self.next_window()? else {
            debug!("[sm-08] No complete window to reconcile yet");
            return Ok(None);
        };
        let window_end = window.rest.last().copied().unwrap_or(window.first);

        let mut run = ReconciliationRun::new(window.first, window_end);
        run.begin();
        self.runs.save(&run)?;

        let mut items = 0;
        let mut findings = Vec::new();
        if let Err(e) = self.audit(&window, &mut items, &mut findings) {
            findings.push(ReconciliationStatus::UnknownError {
                message: e.to_string(),
            });
        }
        run.items_checked = items;
        run.conclude(findings, self.clock.now_nanos());
        self.runs.save(&run)?;

        if run.status.is_failure() {
            for line in describe_findings(&run) {
                warn!("[sm-08] {}", line);
            }
        } else {
            info!("[sm-08] {}", describe(&run));
        }
        Ok(Some(run))
    }

    fn latest_run(&self) -> Result<Option<ReconciliationRun>, ReconciliationError> {
        self.runs.latest()
    }
}
