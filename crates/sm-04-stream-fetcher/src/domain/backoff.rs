//! # Per-Source Backoff
//!
//! Each (stream kind, node) pair carries its own exponential backoff. After
//! a failure the source is skipped until its retry time; the delay doubles
//! from the minimum up to the cap and resets on success. There is no retry
//! limit.

use parking_lot::Mutex;
use shared_types::{NodeId, StreamKind, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct BackoffState {
    failures: u32,
    delay: Duration,
    retry_at: u64,
}

/// Health bookkeeping for every source of every stream.
pub struct SourceHealth {
    min: Duration,
    max: Duration,
    clock: Arc<dyn TimeSource>,
    states: Mutex<HashMap<(StreamKind, NodeId), BackoffState>>,
}

impl SourceHealth {
    pub fn new(min: Duration, max: Duration, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            min,
            max: max.max(min),
            clock,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the source may be queried now.
    pub fn is_available(&self, kind: StreamKind, node_id: NodeId) -> bool {
        let now = self.clock.now_nanos();
        self.states
            .lock()
            .get(&(kind, node_id))
            .map_or(true, |s| now >= s.retry_at)
    }

    /// Clear the source's backoff.
    pub fn record_success(&self, kind: StreamKind, node_id: NodeId) {
        self.states.lock().remove(&(kind, node_id));
    }

    /// Back the source off; returns the delay applied.
    pub fn record_failure(&self, kind: StreamKind, node_id: NodeId) -> Duration {
        let now = self.clock.now_nanos();
        let mut states = self.states.lock();
        let state = states.entry((kind, node_id)).or_insert(BackoffState {
            failures: 0,
            delay: Duration::ZERO,
            retry_at: now,
        });
        state.failures = state.failures.saturating_add(1);
        state.delay = if state.delay.is_zero() {
            self.min
        } else {
            (state.delay * 2).min(self.max)
        };
        state.retry_at = now.saturating_add(state.delay.as_nanos() as u64);
        state.delay
    }

    /// Consecutive failures of the source.
    pub fn failures(&self, kind: StreamKind, node_id: NodeId) -> u32 {
        self.states
            .lock()
            .get(&(kind, node_id))
            .map_or(0, |s| s.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ManualTimeSource;

    fn health() -> (Arc<ManualTimeSource>, SourceHealth) {
        let clock = Arc::new(ManualTimeSource::new(0));
        let health = SourceHealth::new(
            Duration::from_millis(100),
            Duration::from_millis(350),
            clock.clone(),
        );
        (clock, health)
    }

    #[test]
    fn test_delay_doubles_up_to_cap() {
        let (_, health) = health();
        let k = StreamKind::Transaction;
        let delays: Vec<_> = (0..4).map(|_| health.record_failure(k, 1)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(350),
                Duration::from_millis(350),
            ]
        );
        assert_eq!(health.failures(k, 1), 4);
    }

    #[test]
    fn test_source_skipped_until_retry_time() {
        let (clock, health) = health();
        let k = StreamKind::Event;
        health.record_failure(k, 2);
        assert!(!health.is_available(k, 2));
        assert!(health.is_available(k, 3));
        assert!(health.is_available(StreamKind::Balance, 2));

        clock.advance(Duration::from_millis(100));
        assert!(health.is_available(k, 2));
    }

    #[test]
    fn test_success_resets() {
        let (_, health) = health();
        let k = StreamKind::Balance;
        health.record_failure(k, 1);
        health.record_failure(k, 1);
        health.record_success(k, 1);
        assert!(health.is_available(k, 1));
        assert_eq!(health.failures(k, 1), 0);
        assert_eq!(health.record_failure(k, 1), Duration::from_millis(100));
    }
}
