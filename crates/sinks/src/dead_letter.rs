//! Dead-letter sinks
//!
//! Records that could not be delivered after all retries are kept here
//! instead of being discarded. Each record travels in a `DeadLetter`
//! envelope:
//!
//! ```json
//! {"topic":"Syslog.1","error":"publish timed out after 5s","attempts":4,
//!  "failed_at":"2023-01-01T00:00:05.120Z","event":{"Client":"...",...}}
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use relay_config::DeadLetterConfig;
use relay_protocol::SyslogEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Errors from a dead-letter sink
#[derive(Debug, Error)]
pub enum DeadLetterError {
    #[error("dead-letter file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode dead letter: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeadLetterError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// An undeliverable event with its failure context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub topic: String,
    /// Text of the last publish error
    pub error: String,
    /// Publish attempts made, including the first
    pub attempts: u32,
    /// RFC3339 UTC time the record was given up on
    pub failed_at: String,
    pub event: SyslogEvent,
}

impl DeadLetter {
    pub fn new(
        topic: &str,
        error: &impl std::fmt::Display,
        attempts: u32,
        event: SyslogEvent,
    ) -> Self {
        Self {
            topic: topic.to_string(),
            error: error.to_string(),
            attempts,
            failed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event,
        }
    }

    /// Single-line JSON form
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Fallback destination for undeliverable events
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    fn name(&self) -> &str;

    async fn write(&self, letter: &DeadLetter) -> Result<(), DeadLetterError>;
}

/// Writes dead letters as error-level log events
#[derive(Debug, Default)]
pub struct LogDeadLetter;

#[async_trait]
impl DeadLetterSink for LogDeadLetter {
    fn name(&self) -> &str {
        "log"
    }

    async fn write(&self, letter: &DeadLetter) -> Result<(), DeadLetterError> {
        let json = letter.to_json()?;
        tracing::error!(
            topic = %letter.topic,
            attempts = letter.attempts,
            dead_letter = %json,
            "dead-lettered record"
        );
        Ok(())
    }
}

/// Appends dead letters to a JSON lines file
pub struct FileDeadLetter {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileDeadLetter {
    /// Open `path` for appending, creating it and its parent directories
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DeadLetterError> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DeadLetterError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| DeadLetterError::io(&path, e))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DeadLetterSink for FileDeadLetter {
    fn name(&self) -> &str {
        "file"
    }

    async fn write(&self, letter: &DeadLetter) -> Result<(), DeadLetterError> {
        let mut line = letter.to_json()?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| DeadLetterError::io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| DeadLetterError::io(&self.path, e))?;
        Ok(())
    }
}

/// Build the dead-letter sink selected by configuration
pub async fn open_dead_letter(
    config: &DeadLetterConfig,
) -> Result<Arc<dyn DeadLetterSink>, DeadLetterError> {
    match config {
        DeadLetterConfig::Log => Ok(Arc::new(LogDeadLetter)),
        DeadLetterConfig::File(file) => Ok(Arc::new(FileDeadLetter::open(&file.path).await?)),
    }
}

#[cfg(test)]
#[path = "dead_letter_test.rs"]
mod dead_letter_test;
