//! Relay - Metrics
//!
//! Throughput tracking and periodic reporting.
//!
//! # Overview
//!
//! This crate provides:
//! - `Meter`: the shared throughput counter with 1/5/15 minute moving rates
//! - `Counter`: a plain atomic counter for component metrics
//! - Provider traits so the ingest loop and sources can expose counters
//! - `Reporter`: a periodic task writing human or JSON summaries
//!
//! # Metrics Handle Pattern
//!
//! Components keep their counters behind an `Arc` and hand out a
//! `metrics_handle()` implementing the provider trait. The handle stays
//! valid after `run()` consumes the component.
//!
//! ```text
//! Component (owns Arc<Metrics>)
//!     │
//!     ├──► metrics_handle() → Handle (clones Arc, implements Provider trait)
//!     │
//!     └──► run() [consumes self, Arc keeps metrics alive]
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use relay_metrics::{Meter, Reporter};
//!
//! let meter = Arc::new(Meter::new());
//! meter.mark(1);
//!
//! let reporter = Reporter::builder(Arc::clone(&meter)).build();
//! assert!(reporter.render().contains("1 total"));
//! ```

mod collected;
pub mod format;
mod meter;
mod reporter;
mod traits;

pub use collected::{CollectedMetrics, CollectedSource};
pub use format::{HumanFormatter, JsonFormatter, MetricsFormatter};
pub use meter::{Meter, MeterSnapshot};
pub use reporter::{Reporter, ReporterBuilder};
pub use traits::{
    PipelineMetricsProvider, PipelineSnapshot, SourceMetricsProvider, SourceMetricsSnapshot,
};

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter wrapper for convenient metric operations
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    #[inline]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increment the counter by `val`
    #[inline]
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc(&self) {
        self.add(1);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
