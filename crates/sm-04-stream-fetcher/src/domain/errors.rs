//! # Fetcher Errors

use shared_types::{ConsensusTimestamp, StreamKind};
use thiserror::Error;

/// Round-level fetch errors. Single-source failures are not errors at this
/// level; they are reported as [`crate::SourceFailure`]s.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Every source was backed off or failed to answer.
    #[error("No responsive sources for {kind} stream")]
    NoResponsiveSources { kind: StreamKind },

    /// No supporting node served bytes matching the accepted hash.
    #[error("No source served verified bytes for {kind} file at {period} ({tried} tried)")]
    NoVerifiedData {
        kind: StreamKind,
        period: ConsensusTimestamp,
        tried: usize,
    },

    /// Shutdown was requested while the round was in flight.
    #[error("Fetch cancelled by shutdown")]
    Cancelled,

    /// Invalid fetcher settings.
    #[error("Invalid fetcher configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    /// Whether the next round may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::NoResponsiveSources { .. } | FetchError::NoVerifiedData { .. }
        )
    }
}
