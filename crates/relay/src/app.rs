//! Service wiring
//!
//! ```text
//! SyslogUdpSource ──RecordSender──→ inbound queue ──→ Ingestor ──→ Publisher
//!        │                                               │
//!        └──────────── metrics handles ──→ Reporter ←── Meter
//! ```
//!
//! Shutdown: cancelling the source drops the only `RecordSender`, the
//! ingest loop drains what is queued and returns its summary.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use relay_config::Config;
use relay_metrics::{Meter, Reporter};
use relay_pipeline::{IngestSummary, Ingestor, channel};
use relay_sinks::{DeadLetterSink, Publisher, build_publisher, open_dead_letter};
use relay_sources::SyslogUdpSource;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A bound, ready-to-run relay
pub struct Relay {
    config: Config,
    source: SyslogUdpSource,
    publisher: Arc<dyn Publisher>,
    dead_letter: Arc<dyn DeadLetterSink>,
    meter: Arc<Meter>,
}

impl Relay {
    /// Build the configured backends and bind the listener
    pub async fn build(config: Config) -> Result<Self> {
        let publisher = build_publisher(&config.publisher);
        let dead_letter = open_dead_letter(&config.dead_letter)
            .await
            .context("failed to open dead-letter sink")?;
        Self::with_backends(config, publisher, dead_letter)
    }

    /// Bind the listener with caller-supplied backends
    pub fn with_backends(
        config: Config,
        publisher: Arc<dyn Publisher>,
        dead_letter: Arc<dyn DeadLetterSink>,
    ) -> Result<Self> {
        let source = SyslogUdpSource::bind(&config.source)?;

        Ok(Self {
            config,
            source,
            publisher,
            dead_letter,
            meter: Arc::new(Meter::new()),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.source.local_addr()?)
    }

    /// The shared throughput meter
    pub fn meter(&self) -> Arc<Meter> {
        Arc::clone(&self.meter)
    }

    /// Run until `shutdown` resolves or a fail-fast stop
    ///
    /// # Errors
    ///
    /// Returns the `PipelineError` that ended the loop under `fail_fast`.
    pub async fn run<F>(self, shutdown: F) -> Result<IngestSummary>
    where
        F: Future<Output = ()>,
    {
        let Self {
            config,
            source,
            publisher,
            dead_letter,
            meter,
        } = self;

        let ingestor = Ingestor::new(
            &config.pipeline,
            Arc::clone(&publisher),
            Arc::clone(&dead_letter),
            Arc::clone(&meter),
        );
        let (sender, receiver) = channel(
            config.source.queue_size,
            config.source.backpressure,
            ingestor.metrics(),
        );

        let reporter = Reporter::builder(Arc::clone(&meter))
            .config(config.metrics.clone())
            .pipeline(Arc::new(ingestor.metrics_handle()))
            .source(Arc::new(source.metrics_handle()))
            .build();

        let source_cancel = CancellationToken::new();
        let reporter_cancel = CancellationToken::new();

        let reporter_task = tokio::spawn(reporter.run(reporter_cancel.clone()));
        let source_task = tokio::spawn(source.run(sender, source_cancel.clone()));
        let mut ingest_task = tokio::spawn(ingestor.run(receiver));

        info!(
            publisher = publisher.name(),
            dead_letter = dead_letter.name(),
            queue_size = config.source.queue_size,
            on_failure = ?config.pipeline.on_failure,
            "relay running"
        );

        tokio::pin!(shutdown);
        let joined = tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested, draining inbound queue");
                source_cancel.cancel();
                (&mut ingest_task).await
            }
            joined = &mut ingest_task => joined,
        };

        // a fail-fast stop leaves the source running
        source_cancel.cancel();
        if let Err(e) = source_task.await {
            warn!(error = %e, "source task panicked during shutdown");
        }

        reporter_cancel.cancel();
        if let Err(e) = reporter_task.await {
            warn!(error = %e, "reporter task panicked during shutdown");
        }

        let summary = joined.map_err(|e| anyhow!("ingest task failed: {}", e))??;

        let throughput = meter.snapshot();
        info!(
            published = throughput.count,
            mean_rate = throughput.mean_rate,
            "relay stopped"
        );
        Ok(summary)
    }
}
