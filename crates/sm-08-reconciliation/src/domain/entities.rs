//! # Reconciliation Run

use serde::{Deserialize, Serialize};
use shared_types::{ConsensusTimestamp, EntityId};

/// State of a run. Diagnostics are structured; see `report::describe` for
/// the human-readable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    Pending,
    Running,
    Success,
    /// An account's balance change disagrees with its transfers.
    TransferMismatch {
        window_start: ConsensusTimestamp,
        window_end: ConsensusTimestamp,
        account: EntityId,
        expected: i128,
        actual: i128,
    },
    /// An account's token balance change disagrees with its token transfers.
    TokenTransferMismatch {
        window_start: ConsensusTimestamp,
        window_end: ConsensusTimestamp,
        account: EntityId,
        token: EntityId,
        expected: i128,
        actual: i128,
    },
    /// A snapshot does not sum to the network supply. `delta = actual - expected`.
    SupplyMismatch {
        snapshot: ConsensusTimestamp,
        expected: i128,
        actual: i128,
        delta: i128,
    },
    UnknownError {
        message: String,
    },
}

impl ReconciliationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    pub fn is_failure(&self) -> bool {
        self.is_terminal() && *self != Self::Success
    }

    /// Short stable name, for metrics labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::TransferMismatch { .. } => "transfer_mismatch",
            Self::TokenTransferMismatch { .. } => "token_transfer_mismatch",
            Self::SupplyMismatch { .. } => "supply_mismatch",
            Self::UnknownError { .. } => "unknown_error",
        }
    }
}

/// One audit execution, keyed by `window_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRun {
    pub window_start: ConsensusTimestamp,
    pub window_end: ConsensusTimestamp,
    pub status: ReconciliationStatus,
    /// Balance and transfer rows examined.
    pub items_checked: u64,
    /// Wall-clock completion time (ns), set with the terminal status.
    pub completed_at: Option<u64>,
    /// Every violation found, in audit order. `status` is the first of them.
    pub findings: Vec<ReconciliationStatus>,
}

impl ReconciliationRun {
    pub fn new(window_start: ConsensusTimestamp, window_end: ConsensusTimestamp) -> Self {
        Self {
            window_start,
            window_end,
            status: ReconciliationStatus::Pending,
            items_checked: 0,
            completed_at: None,
            findings: Vec::new(),
        }
    }

    /// Pending to running. No-op on any other state.
    pub fn begin(&mut self) -> bool {
        if self.status != ReconciliationStatus::Pending {
            return false;
        }
        self.status = ReconciliationStatus::Running;
        true
    }

    /// Record the terminal status. A terminal run is never changed again.
    pub fn finish(&mut self, status: ReconciliationStatus, completed_at: u64) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.completed_at = Some(completed_at);
        true
    }

    /// Finish with the violations an audit found: success when there are
    /// none, otherwise the first one.
    pub fn conclude(&mut self, findings: Vec<ReconciliationStatus>, completed_at: u64) -> bool {
        let status = findings.first().cloned().unwrap_or(ReconciliationStatus::Success);
        if !self.finish(status, completed_at) {
            return false;
        }
        self.findings = findings;
        true
    }
}
