//! Publisher backend configuration
//!
//! Selects between the broker and the event store with `type`.

use serde::Deserialize;
use std::time::Duration;

/// Publisher backend, tagged by `type`
///
/// # Example
///
/// ```toml
/// [publisher]
/// type = "broker"
/// address = "broker.internal:7400"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublisherConfig {
    /// Fire-and-forget message broker over TCP
    Broker(BrokerPublisherConfig),
    /// Acknowledging ClickHouse event store
    Store(StorePublisherConfig),
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self::Broker(BrokerPublisherConfig::default())
    }
}

impl PublisherConfig {
    /// Backend name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Broker(_) => "broker",
            Self::Store(_) => "store",
        }
    }
}

/// Broker connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerPublisherConfig {
    /// Broker address (host:port)
    /// Default: "127.0.0.1:7400"
    pub address: String,

    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// Timeout for writing one frame
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// Default: true
    pub tcp_keepalive: bool,

    /// Only used if tcp_keepalive is true
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive_interval: Duration,
}

impl Default for BrokerPublisherConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:7400".into(),
            connection_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
            tcp_keepalive: true,
            tcp_keepalive_interval: Duration::from_secs(30),
        }
    }
}

/// ClickHouse event store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorePublisherConfig {
    /// HTTP endpoint
    /// Default: "http://localhost:8123"
    pub url: String,

    /// Default: "default"
    pub database: String,

    /// Default: "default"
    pub username: String,

    /// Default: ""
    pub password: String,

    /// Default: "syslog_v1"
    pub table: String,
}

impl Default for StorePublisherConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            database: "default".into(),
            username: "default".into(),
            password: String::new(),
            table: "syslog_v1".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_broker() {
        let config = PublisherConfig::default();
        assert_eq!(config.kind(), "broker");
    }

    #[test]
    fn test_broker_with_defaults() {
        let config: PublisherConfig = toml::from_str("type = \"broker\"").unwrap();
        let PublisherConfig::Broker(broker) = config else {
            panic!("expected broker");
        };
        assert_eq!(broker.address, "127.0.0.1:7400");
        assert_eq!(broker.write_timeout, Duration::from_secs(5));
        assert!(broker.tcp_keepalive);
    }

    #[test]
    fn test_broker_full() {
        let toml = r#"
type = "broker"
address = "10.1.1.1:9000"
connection_timeout = "2s"
write_timeout = "500ms"
tcp_keepalive = false
"#;
        let PublisherConfig::Broker(broker) = toml::from_str::<PublisherConfig>(toml).unwrap()
        else {
            panic!("expected broker");
        };
        assert_eq!(broker.address, "10.1.1.1:9000");
        assert_eq!(broker.connection_timeout, Duration::from_secs(2));
        assert_eq!(broker.write_timeout, Duration::from_millis(500));
        assert!(!broker.tcp_keepalive);
    }

    #[test]
    fn test_store() {
        let toml = r#"
type = "store"
url = "http://clickhouse:8123"
database = "logs"
username = "relay"
password = "secret"
"#;
        let PublisherConfig::Store(store) = toml::from_str::<PublisherConfig>(toml).unwrap()
        else {
            panic!("expected store");
        };
        assert_eq!(store.url, "http://clickhouse:8123");
        assert_eq!(store.database, "logs");
        assert_eq!(store.username, "relay");
        assert_eq!(store.password, "secret");
        assert_eq!(store.table, "syslog_v1");
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(toml::from_str::<PublisherConfig>("type = \"kafka\"").is_err());
    }
}
