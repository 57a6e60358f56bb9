//! Pipeline error types

use relay_protocol::ValidationError;
use relay_sinks::PublishError;
use thiserror::Error;

/// Errors that end the ingest loop
///
/// Only produced under `FailurePolicy::FailFast`; the record has already
/// been logged, counted and (for publish failures) dead-lettered.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A record failed validation
    #[error("record rejected: {0}")]
    Rejected(#[from] ValidationError),

    /// A record could not be delivered after all retries
    #[error("record undeliverable: {0}")]
    Undeliverable(#[source] PublishError),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
