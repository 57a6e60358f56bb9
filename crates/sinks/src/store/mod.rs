//! Event store publisher
//!
//! Hands the structured event to an `EventStore`, which persists it and
//! answers with the identifier it assigned.

mod clickhouse;

pub use self::clickhouse::{ClickHouseStore, SyslogRow};

use async_trait::async_trait;
use relay_protocol::SyslogEvent;

use crate::publisher::{PublishError, PublishReceipt, Publisher};

/// Acknowledging persistence backend for structured events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist `event` under `topic`, returning the store-assigned id
    async fn store(&self, topic: &str, event: &SyslogEvent) -> Result<String, PublishError>;
}

/// `Publisher` adapter over an `EventStore`
pub struct StorePublisher<S> {
    name: String,
    store: S,
}

impl<S: EventStore> StorePublisher<S> {
    pub fn new(name: impl Into<String>, store: S) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: EventStore> Publisher for StorePublisher<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(
        &self,
        topic: &str,
        event: &SyslogEvent,
    ) -> Result<PublishReceipt, PublishError> {
        let id = self.store.store(topic, event).await?;
        Ok(PublishReceipt::Stored { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use relay_protocol::{RawRecord, TOPIC, validate};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<(String, SyslogEvent)>>,
    }

    #[async_trait]
    impl EventStore for MemoryStore {
        async fn store(&self, topic: &str, event: &SyslogEvent) -> Result<String, PublishError> {
            let mut rows = self.rows.lock().unwrap();
            rows.push((topic.to_string(), event.clone()));
            Ok(format!("row-{}", rows.len()))
        }
    }

    fn event() -> SyslogEvent {
        let record = RawRecord::new()
            .with("client", "10.0.0.5:41000")
            .with("content", "")
            .with("facility", 4i64)
            .with("hostname", "db-02")
            .with("priority", 34i64)
            .with("severity", 2i64)
            .with("tag", "sshd")
            .with(
                "timestamp",
                DateTime::parse_from_rfc3339("2023-05-06T07:08:09+02:00").unwrap(),
            );
        validate(&record).unwrap()
    }

    #[tokio::test]
    async fn test_publish_returns_store_id() {
        let publisher = StorePublisher::new("store", MemoryStore::default());

        let first = publisher.publish(TOPIC, &event()).await.unwrap();
        let second = publisher.publish(TOPIC, &event()).await.unwrap();

        assert_eq!(first, PublishReceipt::Stored { id: "row-1".into() });
        assert_eq!(second, PublishReceipt::Stored { id: "row-2".into() });

        let rows = publisher.store().rows.lock().unwrap();
        assert_eq!(rows[0].0, "Syslog.1");
        assert_eq!(rows[0].1, event());
    }
}
