//! Configuration validation
//!
//! Checks values that deserialize fine but cannot work at runtime:
//! - Zero-sized queues and datagram limits
//! - Empty publisher endpoints
//! - File dead-letter sink without a path
//! - Inverted retry delays and a zero publish timeout

use crate::Config;
use crate::dead_letter::DeadLetterConfig;
use crate::error::{ConfigError, Result};
use crate::publisher::PublisherConfig;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_source(config)?;
    validate_publisher(config)?;
    validate_pipeline(config)?;
    validate_dead_letter(config)?;
    Ok(())
}

fn validate_source(config: &Config) -> Result<()> {
    let source = &config.source;

    if source.address.trim().is_empty() {
        return Err(ConfigError::missing_field("source", "address"));
    }

    if source.queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "source",
            "queue_size",
            "must be greater than 0",
        ));
    }

    if source.max_message_size == 0 {
        return Err(ConfigError::invalid_value(
            "source",
            "max_message_size",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_publisher(config: &Config) -> Result<()> {
    match &config.publisher {
        PublisherConfig::Broker(broker) => {
            if broker.address.trim().is_empty() {
                return Err(ConfigError::missing_field("publisher.broker", "address"));
            }
        }
        PublisherConfig::Store(store) => {
            if store.url.trim().is_empty() {
                return Err(ConfigError::missing_field("publisher.store", "url"));
            }
            if store.database.trim().is_empty() {
                return Err(ConfigError::missing_field("publisher.store", "database"));
            }
            if store.table.trim().is_empty() {
                return Err(ConfigError::missing_field("publisher.store", "table"));
            }
        }
    }
    Ok(())
}

fn validate_pipeline(config: &Config) -> Result<()> {
    let pipeline = &config.pipeline;

    if pipeline.publish_timeout.is_zero() {
        return Err(ConfigError::invalid_value(
            "pipeline",
            "publish_timeout",
            "must be greater than 0",
        ));
    }

    if pipeline.retry_max_delay < pipeline.retry_base_delay {
        return Err(ConfigError::invalid_value(
            "pipeline",
            "retry_max_delay",
            format!(
                "{:?} is shorter than retry_base_delay {:?}",
                pipeline.retry_max_delay, pipeline.retry_base_delay
            ),
        ));
    }

    Ok(())
}

fn validate_dead_letter(config: &Config) -> Result<()> {
    if let DeadLetterConfig::File(file) = &config.dead_letter
        && file.path.as_os_str().is_empty()
    {
        return Err(ConfigError::missing_field("dead_letter.file", "path"));
    }
    Ok(())
}
