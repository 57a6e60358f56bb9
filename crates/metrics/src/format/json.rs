//! JSON metrics formatter
//!
//! Emits one JSON object per report:
//!
//! ```json
//! {"type":"throughput","count":12400,"rate_1m":3.2,"rate_5m":2.95,
//!  "rate_15m":2.1,"mean_rate":2.41,"pipeline":{...},"sources":[...]}
//! ```

use serde::Serialize;

use super::MetricsFormatter;
use crate::{CollectedMetrics, PipelineSnapshot, SourceMetricsSnapshot};

/// JSON metrics formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(rename = "type")]
    report_type: &'static str,
    count: u64,
    rate_1m: f64,
    rate_5m: f64,
    rate_15m: f64,
    mean_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline: Option<&'a PipelineSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<SourceJson<'a>>,
}

#[derive(Serialize)]
struct SourceJson<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    source_type: &'a str,
    #[serde(flatten)]
    snapshot: &'a SourceMetricsSnapshot,
}

impl MetricsFormatter for JsonFormatter {
    fn format(&self, metrics: &CollectedMetrics) -> String {
        let report = ReportJson {
            report_type: "throughput",
            count: metrics.meter.count,
            rate_1m: metrics.meter.rate_1m,
            rate_5m: metrics.meter.rate_5m,
            rate_15m: metrics.meter.rate_15m,
            mean_rate: metrics.meter.mean_rate,
            pipeline: metrics.pipeline.as_ref(),
            sources: metrics
                .sources
                .iter()
                .map(|s| SourceJson {
                    id: &s.id,
                    source_type: &s.source_type,
                    snapshot: &s.snapshot,
                })
                .collect(),
        };

        serde_json::to_string(&report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectedSource, MeterSnapshot};

    #[test]
    fn test_format_meter_only() {
        let metrics = CollectedMetrics {
            meter: MeterSnapshot {
                count: 7,
                ..Default::default()
            },
            ..Default::default()
        };

        let output = JsonFormatter::new().format(&metrics);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["type"], "throughput");
        assert_eq!(json["count"], 7);
        assert!(json.get("pipeline").is_none());
        assert!(json.get("sources").is_none());
    }

    #[test]
    fn test_format_with_providers() {
        let metrics = CollectedMetrics {
            meter: MeterSnapshot::default(),
            pipeline: Some(PipelineSnapshot {
                dead_lettered: 2,
                dropped: 5,
                ..Default::default()
            }),
            sources: vec![CollectedSource {
                id: "udp-514".into(),
                source_type: "syslog_udp".into(),
                snapshot: SourceMetricsSnapshot {
                    packets_received: 9,
                    ..Default::default()
                },
            }],
        };

        let output = JsonFormatter::new().format(&metrics);
        assert!(!output.contains('\n'));

        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["pipeline"]["dead_lettered"], 2);
        assert_eq!(json["pipeline"]["dropped"], 5);
        assert_eq!(json["sources"][0]["id"], "udp-514");
        assert_eq!(json["sources"][0]["type"], "syslog_udp");
        assert_eq!(json["sources"][0]["packets_received"], 9);
    }
}
