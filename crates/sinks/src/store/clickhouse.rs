//! ClickHouse event store
//!
//! Inserts one row per event into the configured table:
//!
//! ```sql
//! CREATE TABLE syslog_v1 (
//!     id UUID,
//!     topic LowCardinality(String),
//!     client String,
//!     content String,
//!     facility Int64,
//!     hostname LowCardinality(String),
//!     priority Int64,
//!     severity Int64,
//!     tag LowCardinality(String),
//!     timestamp DateTime64(3)
//! ) ENGINE = MergeTree()
//! PARTITION BY toYYYYMM(timestamp)
//! ORDER BY (timestamp, hostname);
//! ```

use async_trait::async_trait;
use clickhouse::insert::Insert;
use clickhouse::{Client, Row};
use relay_config::StorePublisherConfig;
use relay_protocol::SyslogEvent;
use serde::Serialize;
use uuid::Uuid;

use super::EventStore;
use crate::publisher::PublishError;

/// One stored syslog event
#[derive(Debug, Clone, Row, Serialize)]
pub struct SyslogRow {
    #[serde(with = "clickhouse::serde::uuid")]
    pub id: Uuid,
    pub topic: String,
    pub client: String,
    pub content: String,
    pub facility: i64,
    pub hostname: String,
    pub priority: i64,
    pub severity: i64,
    pub tag: String,
    /// Event time in milliseconds since the epoch
    pub timestamp: i64,
}

impl SyslogRow {
    pub fn from_event(id: Uuid, topic: &str, event: &SyslogEvent) -> Self {
        Self {
            id,
            topic: topic.to_string(),
            client: event.client().to_string(),
            content: event.content().to_string(),
            facility: event.facility(),
            hostname: event.hostname().to_string(),
            priority: event.priority(),
            severity: event.severity(),
            tag: event.tag().to_string(),
            timestamp: event.timestamp().timestamp_millis(),
        }
    }
}

/// Event store backed by a ClickHouse table
pub struct ClickHouseStore {
    client: Client,
    table: String,
}

impl ClickHouseStore {
    pub fn new(config: &StorePublisherConfig) -> Self {
        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database)
            .with_user(&config.username);

        if !config.password.is_empty() {
            client = client.with_password(&config.password);
        }

        Self {
            client,
            table: config.table.clone(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn insert(&self, row: &SyslogRow) -> Result<(), clickhouse::error::Error> {
        let mut insert: Insert<SyslogRow> = self.client.insert(&self.table).await?;
        insert.write(row).await?;
        insert.end().await
    }
}

#[async_trait]
impl EventStore for ClickHouseStore {
    async fn store(&self, topic: &str, event: &SyslogEvent) -> Result<String, PublishError> {
        let row = SyslogRow::from_event(Uuid::new_v4(), topic, event);

        self.insert(&row).await.map_err(|e| {
            PublishError::Backend(format!("clickhouse insert into {}: {}", self.table, e))
        })?;

        Ok(row.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use relay_protocol::{RawRecord, validate};

    #[test]
    fn test_row_from_event() {
        let ts = DateTime::parse_from_rfc3339("2023-01-01T00:00:01.500+01:00").unwrap();
        let record = RawRecord::new()
            .with("client", "10.0.0.5:41000")
            .with("content", "disk usage high")
            .with("facility", 1i64)
            .with("hostname", "web-01")
            .with("priority", 14i64)
            .with("severity", 6i64)
            .with("tag", "diskmon")
            .with("timestamp", ts);
        let event = validate(&record).unwrap();
        let id = Uuid::new_v4();

        let row = SyslogRow::from_event(id, "Syslog.1", &event);

        assert_eq!(row.id, id);
        assert_eq!(row.topic, "Syslog.1");
        assert_eq!(row.client, "10.0.0.5:41000");
        assert_eq!(row.hostname, "web-01");
        assert_eq!(row.priority, 14);
        // 2022-12-31T23:00:01.5Z
        assert_eq!(row.timestamp, 1_672_527_601_500);
    }

    #[test]
    fn test_store_uses_configured_table() {
        let store = ClickHouseStore::new(&StorePublisherConfig {
            table: "syslog_archive".into(),
            ..Default::default()
        });
        assert_eq!(store.table(), "syslog_archive");
    }
}
