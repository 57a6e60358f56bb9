//! Ingest loop configuration
//!
//! Failure policy, publish timeout and retry backoff.

use serde::Deserialize;
use std::time::Duration;

/// How the ingest loop reacts to a rejected or undeliverable record
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log, count and continue with the next record (default)
    #[default]
    Isolate,
    /// Stop the loop with an error after the record is accounted for
    FailFast,
}

/// Ingest loop configuration
///
/// # Example
///
/// ```toml
/// [pipeline]
/// on_failure = "isolate"
/// publish_timeout = "5s"
/// retry_attempts = 3
/// retry_base_delay = "100ms"
/// retry_max_delay = "5s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Default: isolate
    pub on_failure: FailurePolicy,

    /// Upper bound for a single publish attempt
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub publish_timeout: Duration,

    /// Retries after the first failed attempt
    /// Default: 3
    pub retry_attempts: u32,

    /// Delay before the first retry, doubled after each
    /// Default: 100ms
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,

    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub retry_max_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            on_failure: FailurePolicy::Isolate,
            publish_timeout: Duration::from_secs(5),
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(5),
        }
    }
}
