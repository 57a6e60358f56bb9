//! Periodic throughput reporter
//!
//! Samples the shared `Meter` and any registered providers on the configured
//! interval and writes the formatted result through `tracing`. Runs as its
//! own task until the cancellation token fires.

use std::sync::Arc;

use relay_config::{MetricsConfig, MetricsFormat};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::format::MetricsFormatter;
use crate::{
    CollectedMetrics, CollectedSource, HumanFormatter, JsonFormatter, Meter,
    PipelineMetricsProvider, SourceMetricsProvider,
};

/// Builder for constructing a Reporter
pub struct ReporterBuilder {
    meter: Arc<Meter>,
    config: Option<MetricsConfig>,
    pipeline: Option<Arc<dyn PipelineMetricsProvider>>,
    sources: Vec<Arc<dyn SourceMetricsProvider>>,
}

impl ReporterBuilder {
    pub fn new(meter: Arc<Meter>) -> Self {
        Self {
            meter,
            config: None,
            pipeline: None,
            sources: Vec::new(),
        }
    }

    /// Set the metrics configuration
    pub fn config(mut self, config: MetricsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the ingest loop metrics provider
    pub fn pipeline(mut self, provider: Arc<dyn PipelineMetricsProvider>) -> Self {
        self.pipeline = Some(provider);
        self
    }

    /// Register a source metrics provider
    pub fn source(mut self, provider: Arc<dyn SourceMetricsProvider>) -> Self {
        self.sources.push(provider);
        self
    }

    pub fn build(self) -> Reporter {
        let config = self.config.unwrap_or_default();
        let formatter: Box<dyn MetricsFormatter> = match config.format {
            MetricsFormat::Human => Box::new(HumanFormatter::new()),
            MetricsFormat::Json => Box::new(JsonFormatter::new()),
        };

        Reporter {
            config,
            formatter,
            meter: self.meter,
            pipeline: self.pipeline,
            sources: self.sources,
        }
    }
}

/// Periodic metrics reporter
pub struct Reporter {
    config: MetricsConfig,
    formatter: Box<dyn MetricsFormatter>,
    meter: Arc<Meter>,
    pipeline: Option<Arc<dyn PipelineMetricsProvider>>,
    sources: Vec<Arc<dyn SourceMetricsProvider>>,
}

impl Reporter {
    pub fn builder(meter: Arc<Meter>) -> ReporterBuilder {
        ReporterBuilder::new(meter)
    }

    /// Run the reporter until cancellation
    ///
    /// The first report is written one full interval after start.
    pub async fn run(self, cancel: CancellationToken) {
        if !self.config.enabled {
            info!("metrics reporting disabled");
            return;
        }

        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = period.as_secs(),
            format = ?self.config.format,
            "metrics reporter started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.report();
                }
            }
        }
    }

    fn report(&self) {
        let output = self.render();
        for line in output.lines() {
            info!("{}", line);
        }
    }

    /// Collect and format one report
    pub fn render(&self) -> String {
        self.formatter.format(&self.collect())
    }

    fn collect(&self) -> CollectedMetrics {
        CollectedMetrics {
            meter: self.meter.snapshot(),
            pipeline: self.pipeline.as_ref().map(|p| p.pipeline_snapshot()),
            sources: self
                .sources
                .iter()
                .map(|s| CollectedSource {
                    id: s.source_id().to_string(),
                    source_type: s.source_type().to_string(),
                    snapshot: s.snapshot(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PipelineSnapshot, SourceMetricsSnapshot};
    use std::time::Duration;

    struct FixedPipeline;

    impl PipelineMetricsProvider for FixedPipeline {
        fn pipeline_snapshot(&self) -> PipelineSnapshot {
            PipelineSnapshot {
                received: 4,
                published: 3,
                rejected: 1,
                ..Default::default()
            }
        }
    }

    struct FixedSource;

    impl SourceMetricsProvider for FixedSource {
        fn source_id(&self) -> &str {
            "udp"
        }

        fn source_type(&self) -> &str {
            "syslog_udp"
        }

        fn snapshot(&self) -> SourceMetricsSnapshot {
            SourceMetricsSnapshot {
                packets_received: 4,
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_render_human() {
        let meter = Arc::new(Meter::new());
        meter.mark(3);

        let reporter = Reporter::builder(Arc::clone(&meter))
            .pipeline(Arc::new(FixedPipeline))
            .source(Arc::new(FixedSource))
            .build();

        let output = reporter.render();
        assert!(output.starts_with("[metrics] throughput: 3 total"));
        assert!(output.contains("rejected 1"));
        assert!(output.contains("udp (4 pkts"));
    }

    #[test]
    fn test_render_json() {
        let meter = Arc::new(Meter::new());
        meter.mark(2);

        let reporter = Reporter::builder(meter)
            .config(MetricsConfig {
                format: MetricsFormat::Json,
                ..Default::default()
            })
            .build();

        let json: serde_json::Value = serde_json::from_str(&reporter.render()).unwrap();
        assert_eq!(json["count"], 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let reporter = Reporter::builder(Arc::new(Meter::new()))
            .config(MetricsConfig {
                interval: Duration::from_secs(1),
                ..Default::default()
            })
            .build();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(reporter.run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(3)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("reporter should stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_returns_immediately() {
        let reporter = Reporter::builder(Arc::new(Meter::new()))
            .config(MetricsConfig {
                enabled: false,
                ..Default::default()
            })
            .build();

        reporter.run(CancellationToken::new()).await;
    }
}
