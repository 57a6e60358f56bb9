//! Metrics provider traits
//!
//! Components expose their counters to the reporter through these traits,
//! so the reporter never depends on the crates that own the counters.
//!
//! - Traits use `&self` and return plain `Copy` snapshots
//! - All providers are `Send + Sync`

use serde::Serialize;

/// Point-in-time snapshot of the ingest loop counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSnapshot {
    /// Records taken off the inbound queue
    pub received: u64,
    /// Records delivered to the publisher
    pub published: u64,
    /// Records that failed validation
    pub rejected: u64,
    /// Records that exhausted publish retries and went to the dead-letter sink
    pub dead_lettered: u64,
    /// Dead-letter writes that themselves failed
    pub dead_letter_failures: u64,
    /// Records discarded at the inbound queue by the drop policy
    pub dropped: u64,
}

/// Trait for the ingest loop to provide metrics to the reporter
pub trait PipelineMetricsProvider: Send + Sync {
    fn pipeline_snapshot(&self) -> PipelineSnapshot;
}

/// Point-in-time snapshot of a source's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceMetricsSnapshot {
    pub packets_received: u64,
    pub bytes_received: u64,
    /// Datagrams with nothing to decode
    pub malformed: u64,
    /// Datagrams discarded before decoding (oversized)
    pub dropped: u64,
    /// Socket receive errors
    pub errors: u64,
}

/// Trait for sources to provide metrics to the reporter
pub trait SourceMetricsProvider: Send + Sync {
    /// Unique identifier for this source instance
    fn source_id(&self) -> &str;

    /// Source type (e.g. "syslog_udp")
    fn source_type(&self) -> &str;

    fn snapshot(&self) -> SourceMetricsSnapshot;
}
