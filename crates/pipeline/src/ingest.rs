//! Ingest loop
//!
//! Drains the inbound queue one record at a time:
//!
//! ```text
//! RecordReceiver → validate → publish (timeout + retry) → Meter
//!                     │                  │
//!                     └─ rejected        └─ dead-letter sink
//! ```
//!
//! A record is fully accounted for (published, rejected or dead-lettered)
//! before the next one is taken off the queue. Under `FailurePolicy::Isolate`
//! failures never stop the loop; under `FailFast` the first one ends `run()`
//! with a `PipelineError` after it has been logged and dead-lettered.

use std::sync::Arc;

use relay_config::{FailurePolicy, PipelineConfig};
use relay_metrics::{Meter, PipelineSnapshot};
use relay_protocol::{RawRecord, TOPIC, ValidationError, validate};
use relay_sinks::{DeadLetter, DeadLetterSink, PublishError, PublishReceipt, Publisher};
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};
use crate::inbound::RecordReceiver;
use crate::metrics::{IngestMetrics, IngestMetricsHandle};
use crate::retry::{RetryPolicy, Undelivered, publish_with_retry};

/// Counters at the moment the loop stopped
pub type IngestSummary = PipelineSnapshot;

/// What happened to a single record
#[derive(Debug)]
pub enum RecordOutcome {
    Published(PublishReceipt),
    Rejected(ValidationError),
    DeadLettered(PublishError),
}

impl RecordOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published(_))
    }
}

/// The validate-and-publish consumer
pub struct Ingestor {
    on_failure: FailurePolicy,
    retry: RetryPolicy,
    publisher: Arc<dyn Publisher>,
    dead_letter: Arc<dyn DeadLetterSink>,
    meter: Arc<Meter>,
    metrics: Arc<IngestMetrics>,
}

impl Ingestor {
    pub fn new(
        config: &PipelineConfig,
        publisher: Arc<dyn Publisher>,
        dead_letter: Arc<dyn DeadLetterSink>,
        meter: Arc<Meter>,
    ) -> Self {
        Self {
            on_failure: config.on_failure,
            retry: RetryPolicy::from_config(config),
            publisher,
            dead_letter,
            meter,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Override the retry policy derived from config
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Shared counters, also used by the inbound queue for drops
    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Get a metrics handle for the reporter
    pub fn metrics_handle(&self) -> IngestMetricsHandle {
        IngestMetricsHandle::new(Arc::clone(&self.metrics))
    }

    /// Validate, publish and account for one record
    pub async fn process(&self, raw: &RawRecord) -> RecordOutcome {
        self.metrics.record_received();

        let event = match validate(raw) {
            Ok(event) => event,
            Err(err) => {
                self.metrics.record_rejected();
                warn!(
                    error = %err,
                    fields = ?err.fields(),
                    record = %raw,
                    "rejected syslog record"
                );
                return RecordOutcome::Rejected(err);
            }
        };

        match publish_with_retry(self.publisher.as_ref(), TOPIC, &event, &self.retry).await {
            Ok(receipt) => {
                self.meter.mark(1);
                self.metrics.record_published();
                if let PublishReceipt::Stored { id } = &receipt {
                    debug!(id = %id, "event stored");
                }
                info!(record = %raw, "syslog record");
                RecordOutcome::Published(receipt)
            }
            Err(Undelivered { error, attempts }) => {
                self.metrics.record_dead_lettered();
                error!(
                    publisher = self.publisher.name(),
                    error = %error,
                    attempts = attempts,
                    record = %raw,
                    "publish failed, dead-lettering record"
                );

                let letter = DeadLetter::new(TOPIC, &error, attempts, event);
                if let Err(dl_err) = self.dead_letter.write(&letter).await {
                    self.metrics.record_dead_letter_failure();
                    error!(
                        sink = self.dead_letter.name(),
                        error = %dl_err,
                        event = ?letter.event,
                        "dead-letter write failed, record only kept in this log line"
                    );
                }

                RecordOutcome::DeadLettered(error)
            }
        }
    }

    /// Run the loop until the queue closes or a fail-fast stop
    ///
    /// # Errors
    ///
    /// Only under `FailurePolicy::FailFast`: the first rejected or
    /// undeliverable record ends the loop.
    pub async fn run(self, mut inbound: RecordReceiver) -> Result<IngestSummary> {
        info!(
            publisher = self.publisher.name(),
            dead_letter = self.dead_letter.name(),
            on_failure = ?self.on_failure,
            retries = self.retry.retries,
            "ingest loop started"
        );

        while let Some(raw) = inbound.recv().await {
            let outcome = self.process(&raw).await;

            if self.on_failure == FailurePolicy::FailFast {
                match outcome {
                    RecordOutcome::Published(_) => {}
                    RecordOutcome::Rejected(err) => {
                        error!("stopping ingest loop on rejected record (fail_fast)");
                        return Err(PipelineError::Rejected(err));
                    }
                    RecordOutcome::DeadLettered(err) => {
                        error!("stopping ingest loop on undeliverable record (fail_fast)");
                        return Err(PipelineError::Undeliverable(err));
                    }
                }
            }
        }

        let summary = self.metrics.snapshot();
        info!(
            received = summary.received,
            published = summary.published,
            rejected = summary.rejected,
            dead_lettered = summary.dead_lettered,
            dropped = summary.dropped,
            "ingest loop stopped, inbound queue closed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "ingest_test.rs"]
mod ingest_test;
