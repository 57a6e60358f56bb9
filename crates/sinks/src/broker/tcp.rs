//! TCP broker client
//!
//! Writes one length-prefixed frame per publish:
//!
//! ```text
//! [4 bytes: topic length (big-endian)][topic][4 bytes: payload length (big-endian)][payload]
//! ```
//!
//! The connection is opened lazily on the first send. Any connect or write
//! failure drops it, and the next send reconnects.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use relay_config::BrokerPublisherConfig;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::BrokerClient;
use crate::publisher::PublishError;

/// Encode one broker frame
///
/// # Errors
///
/// Returns `PublishError::TooLarge` if the topic or payload length does not
/// fit in the 32-bit length prefix.
pub fn encode_frame(topic: &str, payload: &[u8]) -> Result<Vec<u8>, PublishError> {
    let topic_len =
        u32::try_from(topic.len()).map_err(|_| PublishError::TooLarge(topic.len()))?;
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| PublishError::TooLarge(payload.len()))?;

    let mut frame = Vec::with_capacity(8 + topic.len() + payload.len());
    frame.extend_from_slice(&topic_len.to_be_bytes());
    frame.extend_from_slice(topic.as_bytes());
    frame.extend_from_slice(&payload_len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Broker client speaking the length-prefixed TCP protocol
pub struct TcpBroker {
    address: String,
    connection_timeout: Duration,
    write_timeout: Duration,
    tcp_keepalive: Option<Duration>,
    connection: Mutex<Option<TcpStream>>,
}

impl TcpBroker {
    pub fn new(config: &BrokerPublisherConfig) -> Self {
        Self {
            address: config.address.clone(),
            connection_timeout: config.connection_timeout,
            write_timeout: config.write_timeout,
            tcp_keepalive: config
                .tcp_keepalive
                .then_some(config.tcp_keepalive_interval),
            connection: Mutex::new(None),
        }
    }

    /// Target address
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connect(&self) -> Result<TcpStream, PublishError> {
        let stream = match timeout(self.connection_timeout, TcpStream::connect(&self.address)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(PublishError::Connection {
                    target: self.address.clone(),
                    source: e,
                });
            }
            Err(_) => {
                return Err(PublishError::Connection {
                    target: self.address.clone(),
                    source: std::io::Error::new(ErrorKind::TimedOut, "connection timed out"),
                });
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(
                target_addr = %self.address,
                error = %e,
                "failed to set TCP_NODELAY, continuing with default buffering"
            );
        }

        if let Some(interval) = self.tcp_keepalive {
            let keepalive = TcpKeepalive::new().with_time(interval);

            #[cfg(target_os = "linux")]
            let keepalive = keepalive.with_interval(interval);

            if let Err(e) = SockRef::from(&stream).set_tcp_keepalive(&keepalive) {
                tracing::debug!(
                    target_addr = %self.address,
                    error = %e,
                    "failed to set TCP keep-alive, continuing without keep-alive"
                );
            }
        }

        tracing::debug!(target_addr = %self.address, "connected to broker");
        Ok(stream)
    }
}

#[async_trait]
impl BrokerClient for TcpBroker {
    async fn send(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let frame = encode_frame(topic, payload)?;

        let mut conn = self.connection.lock().await;
        let mut stream = match conn.take() {
            Some(stream) => stream,
            None => self.connect().await?,
        };

        // on failure a partial frame may have gone out, so the stream is
        // only put back after a complete write
        match timeout(self.write_timeout, stream.write_all(&frame)).await {
            Ok(Ok(())) => {
                *conn = Some(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(PublishError::Write(e)),
            Err(_) => Err(PublishError::Timeout(self.write_timeout)),
        }
    }
}

#[cfg(test)]
#[path = "tcp_test.rs"]
mod tcp_test;
