//! Lightweight metrics for one agent instance.
//!
//! Thread-safe atomic counters for:
//! - queries (Get / GetNext / unsupported)
//! - reload attempts (installed / skipped on lock / failed)
//! - lines rejected while loading
//! - poll ticks
//!
//! The reload trigger reads `queries_total()` to tell idle polls from busy ones.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    // ----- Queries -----
    queries_get: AtomicU64,
    queries_getnext: AtomicU64,
    queries_unsupported: AtomicU64,

    // ----- Reloads -----
    reloads_installed: AtomicU64,
    reloads_skipped_locked: AtomicU64,
    reloads_failed: AtomicU64,
    lines_rejected: AtomicU64,

    // ----- Poller -----
    polls: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_get: u64,
    pub queries_getnext: u64,
    pub queries_unsupported: u64,

    pub reloads_installed: u64,
    pub reloads_skipped_locked: u64,
    pub reloads_failed: u64,
    pub lines_rejected: u64,

    pub polls: u64,
}

impl MetricsSnapshot {
    pub fn queries_total(&self) -> u64 {
        self.queries_get + self.queries_getnext + self.queries_unsupported
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- Recorders (queries) -----
    pub fn record_get(&self) {
        self.queries_get.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_getnext(&self) {
        self.queries_getnext.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_unsupported(&self) {
        self.queries_unsupported.fetch_add(1, Ordering::Relaxed);
    }

    // ----- Recorders (reloads) -----
    pub fn record_reload_installed(&self, rejected_lines: usize) {
        self.reloads_installed.fetch_add(1, Ordering::Relaxed);
        self.lines_rejected
            .fetch_add(rejected_lines as u64, Ordering::Relaxed);
    }
    pub fn record_reload_locked(&self) {
        self.reloads_skipped_locked.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_reload_failed(&self) {
        self.reloads_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Every query handled so far, whatever its mode.
    pub fn queries_total(&self) -> u64 {
        self.queries_get.load(Ordering::Relaxed)
            + self.queries_getnext.load(Ordering::Relaxed)
            + self.queries_unsupported.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_get: self.queries_get.load(Ordering::Relaxed),
            queries_getnext: self.queries_getnext.load(Ordering::Relaxed),
            queries_unsupported: self.queries_unsupported.load(Ordering::Relaxed),

            reloads_installed: self.reloads_installed.load(Ordering::Relaxed),
            reloads_skipped_locked: self.reloads_skipped_locked.load(Ordering::Relaxed),
            reloads_failed: self.reloads_failed.load(Ordering::Relaxed),
            lines_rejected: self.lines_rejected.load(Ordering::Relaxed),

            polls: self.polls.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let m = Metrics::new();
        m.record_get();
        m.record_getnext();
        m.record_getnext();
        m.record_unsupported();
        m.record_reload_installed(3);
        m.record_reload_installed(1);
        m.record_reload_locked();

        let s = m.snapshot();
        assert_eq!(s.queries_total(), 4);
        assert_eq!(m.queries_total(), 4);
        assert_eq!(s.reloads_installed, 2);
        assert_eq!(s.lines_rejected, 4);
        assert_eq!(s.reloads_skipped_locked, 1);
        assert_eq!(s.reloads_failed, 0);
    }
}
