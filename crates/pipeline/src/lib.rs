//! Relay - Pipeline
//!
//! The async ingest loop that connects the syslog source to a publisher.
//!
//! # Architecture
//!
//! ```text
//! [Source]                       [Ingestor]                        [Publisher]
//!   UDP ──→ RecordSender ──→ RecordReceiver ──→ validate ──→ publish_with_retry ──→ broker / store
//!            (bounded,                             │                  │
//!             block or drop)                  rejected log      dead-letter sink
//! ```
//!
//! # Key Design
//!
//! - **Bounded queue**: `inbound::channel` decouples socket reads from
//!   publishing; a full queue either blocks the source or drops the newest
//!   record, per `BackpressurePolicy`
//! - **One record at a time**: each record is published (or given up on)
//!   before the next is taken, so delivery order follows arrival order
//! - **Failure policy**: `Isolate` logs and continues, `FailFast` ends the loop
//! - **Shared meter**: every successful publish marks the `Meter` once
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use relay_metrics::Meter;
//! use relay_pipeline::{Ingestor, channel};
//!
//! let meter = Arc::new(Meter::new());
//! let ingestor = Ingestor::new(&config.pipeline, publisher, dead_letter, meter);
//! let (tx, rx) = channel(10_000, config.source.backpressure, ingestor.metrics());
//!
//! let loop_task = tokio::spawn(ingestor.run(rx));
//! // the source sends RawRecords into tx; dropping every sender ends the loop
//! ```

mod error;
pub mod inbound;
mod ingest;
mod metrics;
pub mod retry;

pub use error::{PipelineError, Result};
pub use inbound::{Admission, QueueClosed, RecordReceiver, RecordSender, channel};
pub use ingest::{IngestSummary, Ingestor, RecordOutcome};
pub use metrics::{BackpressureTracker, IngestMetrics, IngestMetricsHandle};
pub use retry::{RetryPolicy, Undelivered, publish_with_retry};
