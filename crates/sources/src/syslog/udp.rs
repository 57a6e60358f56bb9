//! Syslog UDP Source
//!
//! Receives RFC 3164 datagrams on one socket and pushes a decoded
//! `RawRecord` per datagram into the inbound queue.
//!
//! # Design
//!
//! - One socket, one receive task. Ordering follows arrival order.
//! - Empty and oversized datagrams are counted and dropped before decoding
//! - A full queue is handled by the sender's `BackpressurePolicy`
//! - The cancellation token stops the loop between datagrams, including while
//!   blocked on a full queue
//!
//! # Example
//!
//! ```ignore
//! let source = SyslogUdpSource::bind(&config.source)?;
//! reporter = reporter.source(Arc::new(source.metrics_handle()));
//! tokio::spawn(source.run(sender, cancel.clone()));
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use relay_config::SyslogUdpSourceConfig;
use relay_metrics::{SourceMetricsProvider, SourceMetricsSnapshot};
use relay_pipeline::{Admission, RecordSender};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use super::decode::{decode_datagram, trim_trailing_newline};

/// Identifier reported for the syslog listener
const SOURCE_ID: &str = "syslog_udp";

// =============================================================================
// Metrics
// =============================================================================

/// Syslog UDP source metrics
#[derive(Debug, Default)]
pub struct SyslogUdpSourceMetrics {
    packets_received: AtomicU64,
    bytes_received: AtomicU64,
    malformed: AtomicU64,
    dropped: AtomicU64,
    errors: AtomicU64,
}

impl SyslogUdpSourceMetrics {
    pub const fn new() -> Self {
        Self {
            packets_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn packet_received(&self, bytes: u64) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a datagram with no content after trimming
    #[inline]
    pub fn message_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a datagram larger than `max_message_size`
    #[inline]
    pub fn packet_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn recv_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SourceMetricsSnapshot {
        SourceMetricsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Handle for accessing Syslog UDP source metrics
///
/// Stays valid after the source has been moved into its task.
#[derive(Debug, Clone)]
pub struct SyslogUdpMetricsHandle {
    metrics: Arc<SyslogUdpSourceMetrics>,
}

impl SourceMetricsProvider for SyslogUdpMetricsHandle {
    fn source_id(&self) -> &str {
        SOURCE_ID
    }

    fn source_type(&self) -> &str {
        "syslog_udp"
    }

    fn snapshot(&self) -> SourceMetricsSnapshot {
        self.metrics.snapshot()
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Syslog UDP source errors
#[derive(Debug, thiserror::Error)]
pub enum SyslogUdpSourceError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyslogUdpSourceError {
    fn bind(address: &str, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.to_string(),
            source,
        }
    }
}

// =============================================================================
// Source Implementation
// =============================================================================

/// Syslog UDP source
pub struct SyslogUdpSource {
    socket: UdpSocket,
    max_message_size: usize,
    metrics: Arc<SyslogUdpSourceMetrics>,
}

impl SyslogUdpSource {
    /// Bind the listening socket
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// `SyslogUdpSourceError::Bind` if the address does not resolve or the
    /// socket cannot be bound (port in use, insufficient privilege).
    pub fn bind(config: &SyslogUdpSourceConfig) -> Result<Self, SyslogUdpSourceError> {
        let bind_addr = config.bind_address();
        let addr = resolve(&bind_addr).map_err(|e| SyslogUdpSourceError::bind(&bind_addr, e))?;
        let socket = create_socket(addr, config.buffer_size)
            .map_err(|e| SyslogUdpSourceError::bind(&bind_addr, e))?;

        tracing::info!(
            address = %bind_addr,
            max_message_size = config.max_message_size,
            "syslog UDP source bound"
        );

        Ok(Self {
            socket,
            max_message_size: config.max_message_size,
            metrics: Arc::new(SyslogUdpSourceMetrics::new()),
        })
    }

    /// Address actually bound, useful when the configured port is 0
    pub fn local_addr(&self) -> Result<SocketAddr, SyslogUdpSourceError> {
        Ok(self.socket.local_addr()?)
    }

    /// Get a metrics handle for the reporter
    pub fn metrics_handle(&self) -> SyslogUdpMetricsHandle {
        SyslogUdpMetricsHandle {
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Receive until cancelled or the inbound queue closes
    ///
    /// Dropping `sender` on return is what lets the ingest loop drain and stop.
    pub async fn run(self, sender: RecordSender, cancel: CancellationToken) {
        tracing::info!(
            policy = ?sender.policy(),
            "syslog UDP source listening"
        );

        // One spare byte so truncated oversized datagrams are detectable
        let mut recv_buf = vec![0u8; self.max_message_size + 1];

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("syslog UDP source cancelled");
                    break;
                }

                recv_result = self.socket.recv_from(&mut recv_buf) => {
                    match recv_result {
                        Ok((len, peer)) => {
                            if !self.process_datagram(&recv_buf[..len], peer, &sender, &cancel).await {
                                break;
                            }
                        }
                        Err(e) => {
                            self.metrics.recv_error();
                            tracing::debug!(error = %e, "syslog UDP recv error");
                        }
                    }
                }
            }
        }

        let s = self.metrics.snapshot();
        tracing::info!(
            packets = s.packets_received,
            bytes = s.bytes_received,
            malformed = s.malformed,
            dropped = s.dropped,
            "syslog UDP source stopped"
        );
    }

    /// Handle one datagram; returns false when the source should stop
    async fn process_datagram(
        &self,
        data: &[u8],
        peer: SocketAddr,
        sender: &RecordSender,
        cancel: &CancellationToken,
    ) -> bool {
        self.metrics.packet_received(data.len() as u64);

        if data.len() > self.max_message_size {
            self.metrics.packet_dropped();
            tracing::debug!(
                peer = %peer,
                max = self.max_message_size,
                "syslog UDP packet too large, dropping"
            );
            return true;
        }

        if trim_trailing_newline(data).is_empty() {
            self.metrics.message_malformed();
            tracing::debug!(peer = %peer, "empty syslog UDP packet, dropping");
            return true;
        }

        let record = decode_datagram(data, peer);

        tokio::select! {
            biased;

            _ = cancel.cancelled() => false,

            admitted = sender.send(record) => match admitted {
                Ok(Admission::Accepted | Admission::Dropped) => true,
                Err(_) => {
                    tracing::warn!("inbound queue closed, stopping syslog UDP source");
                    false
                }
            },
        }
    }
}

fn resolve(bind_addr: &str) -> std::io::Result<SocketAddr> {
    bind_addr.to_socket_addrs()?.next().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "address did not resolve")
    })
}

/// Create a non-blocking UDP socket with the requested receive buffer
fn create_socket(addr: SocketAddr, buffer_size: Option<usize>) -> std::io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if let Some(size) = buffer_size
        && let Err(e) = socket.set_recv_buffer_size(size)
    {
        tracing::warn!(
            error = %e,
            requested_size = size,
            "failed to set UDP SO_RCVBUF"
        );
    }

    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

#[cfg(test)]
#[path = "udp_test.rs"]
mod udp_test;
