//! Relay Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid config: listen on UDP 514, publish to a local
//! broker, isolate failures and report throughput every minute.
//!
//! # Parsing
//!
//! ```
//! use relay_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[source]\nport = 5514").unwrap();
//! assert_eq!(config.source.port, 5514);
//! ```
//!
//! # Example Full Config
//!
//! See `configs/relay.toml` for all available options.

mod dead_letter;
mod error;
mod logging;
mod metrics;
mod pipeline;
mod publisher;
mod source;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use dead_letter::{DeadLetterConfig, FileDeadLetterConfig};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metrics::{MetricsConfig, MetricsFormat};
pub use pipeline::{FailurePolicy, PipelineConfig};
pub use publisher::{BrokerPublisherConfig, PublisherConfig, StorePublisherConfig};
pub use source::{BackpressurePolicy, SyslogUdpSourceConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,

    /// Periodic throughput report
    pub metrics: MetricsConfig,

    /// UDP listener and inbound queue
    pub source: SyslogUdpSourceConfig,

    /// Broker or event store backend
    pub publisher: PublisherConfig,

    /// Failure policy, timeout and retries of the ingest loop
    pub pipeline: PipelineConfig,

    /// Destination for undeliverable records
    pub dead_letter: DeadLetterConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Call again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
