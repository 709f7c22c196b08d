//! Process-local counters for the refresh loop, fan-out and proxy.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    refreshes_succeeded: AtomicU64,
    refreshes_failed: AtomicU64,
    refreshes_coalesced: AtomicU64,
    broadcasts_sent: AtomicU64,
    subscribers_pruned: AtomicU64,
    upstream_errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_succeeded(&self) {
        self.refreshes_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "refreshes_succeeded", "Metric incremented");
    }

    pub fn refresh_failed(&self) {
        self.refreshes_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "refreshes_failed", "Metric incremented");
    }

    pub fn refresh_coalesced(&self) {
        self.refreshes_coalesced.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "refreshes_coalesced", "Metric incremented");
    }

    pub fn broadcast_sent(&self) {
        self.broadcasts_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subscriber_pruned(&self) {
        self.subscribers_pruned.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "subscribers_pruned", "Metric incremented");
    }

    pub fn upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "upstream_errors", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            refreshes_succeeded: self.refreshes_succeeded.load(Ordering::Relaxed),
            refreshes_failed: self.refreshes_failed.load(Ordering::Relaxed),
            refreshes_coalesced: self.refreshes_coalesced.load(Ordering::Relaxed),
            broadcasts_sent: self.broadcasts_sent.load(Ordering::Relaxed),
            subscribers_pruned: self.subscribers_pruned.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub refreshes_succeeded: u64,
    pub refreshes_failed: u64,
    pub refreshes_coalesced: u64,
    pub broadcasts_sent: u64,
    pub subscribers_pruned: u64,
    pub upstream_errors: u64,
}
