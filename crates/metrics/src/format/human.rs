//! Human-readable metrics formatter
//!
//! # Example Output
//!
//! ```text
//! [metrics] throughput: 12.4K total | 1m: 3.20/s | 5m: 2.95/s | 15m: 2.10/s | mean: 2.41/s
//! [metrics] pipeline: received 12.5K | published 12.4K | rejected 31 | dead-lettered 0 | dl failures 0 | dropped 0
//! [metrics] sources: syslog_udp (12.5K pkts, 2.1 MB, 0 malformed, 0 dropped)
//! ```

use std::fmt::Write;

use super::{MetricsFormatter, format_bytes, format_count, format_rate};
use crate::CollectedMetrics;

/// Human-readable metrics formatter
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    pub fn new() -> Self {
        Self
    }

    fn format_throughput(&self, metrics: &CollectedMetrics) -> String {
        let meter = &metrics.meter;
        format!(
            "[metrics] throughput: {} total | 1m: {} | 5m: {} | 15m: {} | mean: {}",
            format_count(meter.count),
            format_rate(meter.rate_1m),
            format_rate(meter.rate_5m),
            format_rate(meter.rate_15m),
            format_rate(meter.mean_rate),
        )
    }

    fn format_pipeline(&self, metrics: &CollectedMetrics) -> Option<String> {
        let pipeline = metrics.pipeline.as_ref()?;

        Some(format!(
            "[metrics] pipeline: received {} | published {} | rejected {} | dead-lettered {} | dl failures {} | dropped {}",
            format_count(pipeline.received),
            format_count(pipeline.published),
            format_count(pipeline.rejected),
            format_count(pipeline.dead_lettered),
            format_count(pipeline.dead_letter_failures),
            format_count(pipeline.dropped),
        ))
    }

    fn format_sources(&self, metrics: &CollectedMetrics) -> Option<String> {
        if metrics.sources.is_empty() {
            return None;
        }

        let mut output = String::from("[metrics] sources:");

        for (i, source) in metrics.sources.iter().enumerate() {
            if i > 0 {
                output.push_str(" |");
            }

            let snapshot = &source.snapshot;
            let _ = write!(
                output,
                " {} ({} pkts, {}, {} malformed, {} dropped",
                source.id,
                format_count(snapshot.packets_received),
                format_bytes(snapshot.bytes_received),
                snapshot.malformed,
                snapshot.dropped,
            );

            if snapshot.errors > 0 {
                let _ = write!(output, ", {} err", snapshot.errors);
            }

            output.push(')');
        }

        Some(output)
    }
}

impl MetricsFormatter for HumanFormatter {
    fn format(&self, metrics: &CollectedMetrics) -> String {
        let mut lines = Vec::with_capacity(3);
        lines.push(self.format_throughput(metrics));

        if let Some(line) = self.format_pipeline(metrics) {
            lines.push(line);
        }

        if let Some(line) = self.format_sources(metrics) {
            lines.push(line);
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectedSource, MeterSnapshot, PipelineSnapshot, SourceMetricsSnapshot};

    fn sample() -> CollectedMetrics {
        CollectedMetrics {
            meter: MeterSnapshot {
                count: 1500,
                rate_1m: 3.2,
                rate_5m: 2.0,
                rate_15m: 1.0,
                mean_rate: 0.5,
            },
            pipeline: Some(PipelineSnapshot {
                received: 1531,
                published: 1500,
                rejected: 31,
                ..Default::default()
            }),
            sources: vec![CollectedSource {
                id: "syslog_udp".into(),
                source_type: "syslog_udp".into(),
                snapshot: SourceMetricsSnapshot {
                    packets_received: 1531,
                    bytes_received: 2048,
                    errors: 2,
                    ..Default::default()
                },
            }],
        }
    }

    #[test]
    fn test_format_meter_only() {
        let output = HumanFormatter::new().format(&CollectedMetrics::default());
        assert_eq!(
            output,
            "[metrics] throughput: 0 total | 1m: 0.00/s | 5m: 0.00/s | 15m: 0.00/s | mean: 0.00/s"
        );
    }

    #[test]
    fn test_format_full_report() {
        let output = HumanFormatter::new().format(&sample());
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("1.5K total"));
        assert!(lines[0].contains("1m: 3.20/s"));
        assert!(lines[1].contains("rejected 31"));
        assert!(lines[1].contains("dropped 0"));
        assert_eq!(
            lines[2],
            "[metrics] sources: syslog_udp (1.5K pkts, 2.0 KB, 0 malformed, 0 dropped, 2 err)"
        );
    }
}
