//! Syslog UDP source configuration

use serde::Deserialize;

/// What the source does when the inbound queue is full
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Wait for the ingest loop to make room (default)
    #[default]
    Block,
    /// Discard the incoming record and count it
    DropNewest,
}

/// Syslog UDP source configuration
///
/// # Example
///
/// ```toml
/// [source]
/// address = "0.0.0.0"
/// port = 514
/// buffer_size = 4194304
/// max_message_size = 8192
/// queue_size = 10000
/// backpressure = "drop_newest"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyslogUdpSourceConfig {
    /// Bind address
    /// Default: "0.0.0.0"
    pub address: String,

    /// Listen port (0 binds an ephemeral port)
    /// Default: 514
    pub port: u16,

    /// Socket receive buffer size (bytes), OS default when unset
    pub buffer_size: Option<usize>,

    /// Largest datagram accepted; larger ones are dropped
    /// Default: 8192
    pub max_message_size: usize,

    /// Capacity of the queue between the source and the ingest loop
    /// Default: 10000
    pub queue_size: usize,

    /// Default: block
    pub backpressure: BackpressurePolicy,
}

impl Default for SyslogUdpSourceConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 514,
            buffer_size: None,
            max_message_size: 8192,
            queue_size: 10_000,
            backpressure: BackpressurePolicy::Block,
        }
    }
}

impl SyslogUdpSourceConfig {
    /// `address:port` string suitable for `SocketAddr` parsing
    pub fn bind_address(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}
