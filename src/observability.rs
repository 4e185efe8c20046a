//! Worker counters, exposed through the health endpoint

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    batches_received: AtomicU64,
    batches_failed: AtomicU64,
    messages_received: AtomicU64,
    messages_acknowledged: AtomicU64,
    messages_failed: AtomicU64,
    objects_fetched: AtomicU64,
    objects_missing: AtomicU64,
    bytes_written: AtomicU64,
    loop_faults: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_received(&self, messages: usize) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
        self.messages_received
            .fetch_add(messages as u64, Ordering::Relaxed);
    }

    pub fn batch_failed(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "batches_failed", "Metric incremented");
    }

    pub fn message_acknowledged(&self) {
        self.messages_acknowledged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_failed(&self) {
        self.messages_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "messages_failed", "Metric incremented");
    }

    pub fn object_fetched(&self, bytes: u64) {
        self.objects_fetched.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn object_missing(&self) {
        self.objects_missing.fetch_add(1, Ordering::Relaxed);
    }

    pub fn loop_fault(&self) {
        self.loop_faults.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "loop_faults", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_acknowledged: self.messages_acknowledged.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            objects_fetched: self.objects_fetched.load(Ordering::Relaxed),
            objects_missing: self.objects_missing.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            loop_faults: self.loop_faults.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub batches_received: u64,
    pub batches_failed: u64,
    pub messages_received: u64,
    pub messages_acknowledged: u64,
    pub messages_failed: u64,
    pub objects_fetched: u64,
    pub objects_missing: u64,
    pub bytes_written: u64,
    pub loop_faults: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = Metrics::new();
        metrics.batch_received(3);
        metrics.message_acknowledged();
        metrics.message_failed();
        metrics.object_fetched(128);
        metrics.object_fetched(72);
        metrics.object_missing();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_received, 1);
        assert_eq!(snapshot.messages_received, 3);
        assert_eq!(snapshot.messages_acknowledged, 1);
        assert_eq!(snapshot.messages_failed, 1);
        assert_eq!(snapshot.objects_fetched, 2);
        assert_eq!(snapshot.bytes_written, 200);
        assert_eq!(snapshot.objects_missing, 1);
        assert_eq!(snapshot.loop_faults, 0);
    }
}
