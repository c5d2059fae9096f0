//! Progress counters for the consume loop.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the consume loop and observers.
#[derive(Debug, Default)]
pub struct PipelineStats {
    events_applied: AtomicU64,
    events_skipped: AtomicU64,
    events_dead_lettered: AtomicU64,
    apply_failures: AtomicU64,
}

/// A point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub events_applied: u64,
    pub events_skipped: u64,
    pub events_dead_lettered: u64,
    pub apply_failures: u64,
}

impl PipelineStats {
    pub fn record_applied(&self) {
        self.events_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.events_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dead_lettered(&self) {
        self.events_dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_apply_failure(&self) {
        self.apply_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_applied: self.events_applied.load(Ordering::Relaxed),
            events_skipped: self.events_skipped.load(Ordering::Relaxed),
            events_dead_lettered: self.events_dead_lettered.load(Ordering::Relaxed),
            apply_failures: self.apply_failures.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Events that left the stream, one way or another.
    pub fn events_settled(&self) -> u64 {
        self.events_applied + self.events_skipped + self.events_dead_lettered
    }
}
