//! # Time Source
//!
//! Abstract clock so lease expiry, backoff and reconciliation scheduling can be
//! driven deterministically in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::entities::ConsensusTimestamp;

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time in nanoseconds since the Unix epoch.
    fn now_nanos(&self) -> ConsensusTimestamp;
}

/// Default time source using system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_nanos(&self) -> ConsensusTimestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicU64,
}

impl ManualTimeSource {
    /// Create a clock starting at `start` nanoseconds.
    pub fn new(start: ConsensusTimestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: ConsensusTimestamp) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_nanos(&self) -> ConsensusTimestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_time_is_after_2020() {
        let now = SystemTimeSource.now_nanos();
        assert!(now > 1_577_836_800_000_000_000);
    }

    #[test]
    fn test_manual_time_advances() {
        let clock = ManualTimeSource::new(1_000);
        clock.advance(Duration::from_nanos(500));
        assert_eq!(clock.now_nanos(), 1_500);
        clock.set(10);
        assert_eq!(clock.now_nanos(), 10);
    }
}
