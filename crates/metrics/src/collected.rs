//! Collected metrics
//!
//! One reporter sample: the meter plus whatever providers were registered.

use crate::{MeterSnapshot, PipelineSnapshot, SourceMetricsSnapshot};

/// A source snapshot tagged with its identity
#[derive(Debug, Clone)]
pub struct CollectedSource {
    pub id: String,
    pub source_type: String,
    pub snapshot: SourceMetricsSnapshot,
}

/// Everything gathered in a single report tick
#[derive(Debug, Clone, Default)]
pub struct CollectedMetrics {
    pub meter: MeterSnapshot,
    pub pipeline: Option<PipelineSnapshot>,
    pub sources: Vec<CollectedSource>,
}
