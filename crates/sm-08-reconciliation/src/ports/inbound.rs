//! # Inbound Ports

use crate::domain::entities::ReconciliationRun;
use crate::domain::errors::ReconciliationError;

pub trait ReconciliationApi: Send + Sync {
    /// Audit the next window if this instance leads the job and one is
    /// ready. `Ok(None)` means nothing was done.
    fn run_once(&self) -> Result<Option<ReconciliationRun>, ReconciliationError>;

    /// Most recently recorded run.
    fn latest_run(&self) -> Result<Option<ReconciliationRun>, ReconciliationError>;
}
