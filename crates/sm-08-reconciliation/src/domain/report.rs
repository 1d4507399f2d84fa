//! # Run Reporting
//!
//! Human-readable diagnostics, formatted at the reporting boundary.

use super::entities::{ReconciliationRun, ReconciliationStatus};

/// One-line description of a run's outcome.
pub fn describe(run: &ReconciliationRun) -> String {
    let text = describe_status(run, &run.status);
    match run.findings.len() {
        0 | 1 => text,
        n => format!("{} (+{} more violations in window)", text, n - 1),
    }
}

/// One line per violation found, in audit order.
pub fn describe_findings(run: &ReconciliationRun) -> Vec<String> {
    run.findings.iter().map(|f| describe_status(run, f)).collect()
}

fn describe_status(run: &ReconciliationRun, status: &ReconciliationStatus) -> String {
    let window = format!("[{}, {}]", run.window_start, run.window_end);
    match status {
        ReconciliationStatus::Pending => format!("Reconciliation of {} pending", window),
        ReconciliationStatus::Running => format!("Reconciliation of {} running", window),
        ReconciliationStatus::Success => format!(
            "Reconciliation of {} succeeded ({} items checked)",
            window, run.items_checked
        ),
        ReconciliationStatus::TransferMismatch {
            window_start,
            window_end,
            account,
            expected,
            actual,
        } => format!(
            "Transfer mismatch for account {} between snapshots {} and {}: \
             expected balance {}, found {}",
            account, window_start, window_end, expected, actual
        ),
        ReconciliationStatus::TokenTransferMismatch {
            window_start,
            window_end,
            account,
            token,
            expected,
            actual,
        } => format!(
            "Token transfer mismatch for account {} token {} between snapshots {} and {}: \
             expected balance {}, found {}",
            account, token, window_start, window_end, expected, actual
        ),
        ReconciliationStatus::SupplyMismatch {
            snapshot,
            expected,
            actual,
            delta,
        } => format!(
            "Supply mismatch at snapshot {}: expected {}, found {} (delta {:+})",
            snapshot, expected, actual, delta
        ),
        ReconciliationStatus::UnknownError { message } => {
            format!("Reconciliation of {} failed: {}", window, message)
        }
    }
}
