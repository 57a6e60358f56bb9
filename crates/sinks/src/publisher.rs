//! Publisher capability
//!
//! The ingest loop hands every validated event to an `Arc<dyn Publisher>`.
//! Implementations make exactly one attempt per call; retries, timeouts and
//! dead-lettering belong to the caller.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use relay_protocol::SyslogEvent;
use thiserror::Error;

/// Outcome of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReceipt {
    /// Accepted by a fire-and-forget broker
    Published,
    /// Persisted by an event store under the returned identifier
    Stored { id: String },
}

/// Errors from a publish attempt
#[derive(Debug, Error)]
pub enum PublishError {
    /// Could not reach the backend
    #[error("failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Connection was established but the write failed
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// The attempt did not finish in time
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    /// Event could not be encoded
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Encoded event does not fit the wire format
    #[error("payload of {0} bytes exceeds the frame limit")]
    TooLarge(usize),

    /// The backend rejected the write
    #[error("backend error: {0}")]
    Backend(String),

    /// The publisher is misconfigured
    #[error("invalid publisher configuration: {0}")]
    Config(String),
}

impl PublishError {
    /// Whether retrying the same event could succeed
    ///
    /// Encoding and configuration problems fail identically every time.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            Self::Serialization(_) | Self::TooLarge(_) | Self::Config(_)
        )
    }
}

/// A backend that accepts canonical syslog events
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Name for logging
    fn name(&self) -> &str;

    /// Make one attempt to publish `event` under `topic`
    async fn publish(
        &self,
        topic: &str,
        event: &SyslogEvent,
    ) -> Result<PublishReceipt, PublishError>;
}
