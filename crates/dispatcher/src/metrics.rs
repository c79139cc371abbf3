//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Launch-to-exit attempts started
    attempts: AtomicU64,
    /// Deliveries that succeeded
    successes: AtomicU64,
    /// Attempts that failed (launch, pipe, wait or non-zero exit)
    failed_attempts: AtomicU64,
    /// Deliveries that used every attempt and still failed
    exhausted: AtomicU64,
    interrupts_sent: AtomicU64,
    kills_sent: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_successes(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed_attempts(&self) {
        self.failed_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_interrupts_sent(&self) {
        self.interrupts_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_kills_sent(&self) {
        self.kills_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            interrupts_sent: self.interrupts_sent.load(Ordering::Relaxed),
            kills_sent: self.kills_sent.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failed_attempts: u64,
    pub exhausted: u64,
    pub interrupts_sent: u64,
    pub kills_sent: u64,
}
