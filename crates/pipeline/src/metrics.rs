//! Ingest loop metrics
//!
//! Atomic counters shared between the ingest loop, the inbound queue and
//! the reporter. All operations use relaxed ordering; values are eventually
//! consistent, not real-time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use relay_metrics::{Counter, PipelineMetricsProvider, PipelineSnapshot};

/// Counters for one ingest loop and its inbound queue
#[derive(Debug, Default)]
pub struct IngestMetrics {
    received: Counter,
    published: Counter,
    rejected: Counter,
    dead_lettered: Counter,
    dead_letter_failures: Counter,
    dropped: Counter,
}

impl IngestMetrics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            received: Counter::new(),
            published: Counter::new(),
            rejected: Counter::new(),
            dead_lettered: Counter::new(),
            dead_letter_failures: Counter::new(),
            dropped: Counter::new(),
        }
    }

    #[inline]
    pub fn record_received(&self) {
        self.received.inc();
    }

    #[inline]
    pub fn record_published(&self) {
        self.published.inc();
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.rejected.inc();
    }

    #[inline]
    pub fn record_dead_lettered(&self) {
        self.dead_lettered.inc();
    }

    #[inline]
    pub fn record_dead_letter_failure(&self) {
        self.dead_letter_failures.inc();
    }

    /// Record a record discarded at the inbound queue
    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.inc();
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            received: self.received.get(),
            published: self.published.get(),
            rejected: self.rejected.get(),
            dead_lettered: self.dead_lettered.get(),
            dead_letter_failures: self.dead_letter_failures.get(),
            dropped: self.dropped.get(),
        }
    }
}

/// Lightweight handle exposing `IngestMetrics` to the reporter
///
/// Stays valid after `Ingestor::run()` consumes the ingestor.
#[derive(Debug, Clone)]
pub struct IngestMetricsHandle {
    metrics: Arc<IngestMetrics>,
}

impl IngestMetricsHandle {
    pub(crate) fn new(metrics: Arc<IngestMetrics>) -> Self {
        Self { metrics }
    }
}

impl PipelineMetricsProvider for IngestMetricsHandle {
    fn pipeline_snapshot(&self) -> PipelineSnapshot {
        self.metrics.snapshot()
    }
}

/// Rate-limited logging of queue drops
///
/// Aggregates drops and emits at most one line per second, escalating to
/// ERROR when more than `CRITICAL_DROP_THRESHOLD` records were dropped in
/// that second.
pub struct BackpressureTracker {
    /// Drops in current interval
    interval_drops: AtomicU64,
    /// Last log time (epoch milliseconds)
    last_log_ms: AtomicU64,
}

/// Log interval in milliseconds
const LOG_INTERVAL_MS: u64 = 1000;
/// Drops per interval that trigger ERROR level
const CRITICAL_DROP_THRESHOLD: u64 = 100;

impl BackpressureTracker {
    pub fn new() -> Self {
        Self {
            interval_drops: AtomicU64::new(0),
            last_log_ms: AtomicU64::new(Self::now_ms()),
        }
    }

    /// Record a dropped record; returns true if a log line was emitted
    pub fn record_drop(&self) -> bool {
        self.interval_drops.fetch_add(1, Ordering::Relaxed);
        self.maybe_log()
    }

    fn maybe_log(&self) -> bool {
        let now = Self::now_ms();
        let last = self.last_log_ms.load(Ordering::Relaxed);

        if now.saturating_sub(last) < LOG_INTERVAL_MS {
            return false;
        }

        // claim the log slot so concurrent senders don't both log
        if self
            .last_log_ms
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        let drops = self.interval_drops.swap(0, Ordering::Relaxed);
        if drops == 0 {
            return false;
        }

        if drops > CRITICAL_DROP_THRESHOLD {
            tracing::error!(
                dropped_records = drops,
                threshold = CRITICAL_DROP_THRESHOLD,
                "high backpressure: inbound queue full, ingest loop cannot keep up"
            );
        } else {
            tracing::warn!(
                dropped_records = drops,
                "backpressure: records dropped at inbound queue"
            );
        }

        true
    }

    #[inline]
    fn now_ms() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn current_drops(&self) -> u64 {
        self.interval_drops.load(Ordering::Relaxed)
    }
}

impl Default for BackpressureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackpressureTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackpressureTracker")
            .field(
                "interval_drops",
                &self.interval_drops.load(Ordering::Relaxed),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let snapshot = IngestMetrics::new().snapshot();
        assert_eq!(snapshot, PipelineSnapshot::default());
    }

    #[test]
    fn test_record_counters() {
        let metrics = IngestMetrics::new();
        metrics.record_received();
        metrics.record_received();
        metrics.record_received();
        metrics.record_published();
        metrics.record_rejected();
        metrics.record_dead_lettered();
        metrics.record_dead_letter_failure();
        metrics.record_dropped();
        metrics.record_dropped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.received, 3);
        assert_eq!(snapshot.published, 1);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.dead_lettered, 1);
        assert_eq!(snapshot.dead_letter_failures, 1);
        assert_eq!(snapshot.dropped, 2);
    }

    #[test]
    fn test_handle_reads_shared_metrics() {
        let metrics = Arc::new(IngestMetrics::new());
        let handle = IngestMetricsHandle::new(Arc::clone(&metrics));

        metrics.record_rejected();
        assert_eq!(handle.pipeline_snapshot().rejected, 1);
    }

    #[test]
    fn test_backpressure_tracker_accumulates() {
        let tracker = BackpressureTracker::new();

        // within the first second nothing is logged
        assert!(!tracker.record_drop());
        assert!(!tracker.record_drop());
        assert_eq!(tracker.current_drops(), 2);
    }

    #[test]
    fn test_backpressure_tracker_logs_after_interval() {
        let tracker = BackpressureTracker::new();
        tracker
            .last_log_ms
            .store(BackpressureTracker::now_ms() - 2 * LOG_INTERVAL_MS, Ordering::Relaxed);

        assert!(tracker.record_drop());
        assert_eq!(tracker.current_drops(), 0);
    }

    #[test]
    fn test_backpressure_tracker_debug() {
        let tracker = BackpressureTracker::new();
        tracker.record_drop();

        let debug = format!("{:?}", tracker);
        assert!(debug.contains("BackpressureTracker"));
        assert!(debug.contains("interval_drops"));
    }
}
