//! Process-wide activity counters.
//!
//! Every driver records into the same [`ActivityLog`]; all counters are
//! atomics so concurrent drivers never block each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current run.
#[derive(Debug)]
pub struct ActivityLog {
    /// Manager ticks completed
    ticks: AtomicU64,
    /// State transitions observed
    transitions: AtomicU64,
    /// Transitions into `Alert`
    alerts: AtomicU64,
    /// Ticks abandoned because the manager returned an error
    skipped_ticks: AtomicU64,
    /// Status reports the consumer could not keep up with
    dropped_reports: AtomicU64,
    run_start: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            transitions: AtomicU64::new(0),
            alerts: AtomicU64::new(0),
            skipped_ticks: AtomicU64::new(0),
            dropped_reports: AtomicU64::new(0),
            run_start: Utc::now(),
        }
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert(&self) {
        self.alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_tick(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_report(&self) {
        self.dropped_reports.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the current counters.
    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            transitions: self.transitions.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
            dropped_reports: self.dropped_reports.load(Ordering::Relaxed),
            run_start: self.run_start,
            run_duration_secs: (Utc::now() - self.run_start).num_seconds().max(0) as u64,
        }
    }

    /// Multi-line summary for display at shutdown.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Run Statistics:\n\
             - Ticks completed: {}\n\
             - State transitions: {}\n\
             - Alerts raised: {}\n\
             - Ticks skipped: {}\n\
             - Reports dropped: {}\n\
             - Run duration: {} seconds",
            stats.ticks,
            stats.transitions,
            stats.alerts,
            stats.skipped_ticks,
            stats.dropped_reports,
            stats.run_duration_secs
        )
    }

    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
        self.transitions.store(0, Ordering::Relaxed);
        self.alerts.store(0, Ordering::Relaxed);
        self.skipped_ticks.store(0, Ordering::Relaxed);
        self.dropped_reports.store(0, Ordering::Relaxed);
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of activity counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub ticks: u64,
    pub transitions: u64,
    pub alerts: u64,
    pub skipped_ticks: u64,
    pub dropped_reports: u64,
    pub run_start: DateTime<Utc>,
    pub run_duration_secs: u64,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}
