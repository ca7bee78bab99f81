use serde::Serialize;
use std::sync::Mutex;

/// Running counters for store and vote activity.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub votes_accepted: u64,
    pub votes_rejected: u64,
    pub transaction_conflicts: u64,
    pub store_errors: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_insert(&self) {
        self.update(|m| m.inserts += 1);
    }

    pub fn record_vote_accepted(&self, conflicts: usize) {
        self.update(|m| {
            m.votes_accepted += 1;
            m.transaction_conflicts += conflicts as u64;
        });
    }

    pub fn record_vote_rejected(&self) {
        self.update(|m| m.votes_rejected += 1);
    }

    pub fn record_store_error(&self) {
        self.update(|m| m.store_errors += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_insert();
        metrics.record_vote_accepted(2);
        metrics.record_vote_accepted(0);
        metrics.record_vote_rejected();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.inserts, 1);
        assert_eq!(snapshot.votes_accepted, 2);
        assert_eq!(snapshot.transaction_conflicts, 2);
        assert_eq!(snapshot.votes_rejected, 1);
        assert_eq!(snapshot.store_errors, 0);
    }
}
