//! Tests for the broker publisher adapter

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use relay_protocol::{RawRecord, SyslogEvent, TOPIC, validate};

use super::{BrokerClient, BrokerPublisher};
use crate::publisher::{PublishError, PublishReceipt, Publisher};

#[derive(Default)]
struct RecordingClient {
    sent: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl BrokerClient for RecordingClient {
    async fn send(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.sent
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

struct RefusingClient;

#[async_trait]
impl BrokerClient for RefusingClient {
    async fn send(&self, _topic: &str, _payload: &[u8]) -> Result<(), PublishError> {
        Err(PublishError::Backend("broker unavailable".into()))
    }
}

fn disk_usage_event() -> SyslogEvent {
    let record = RawRecord::new()
        .with("client", "10.0.0.5:41000")
        .with("content", "disk usage high")
        .with("facility", 1i64)
        .with("hostname", "web-01")
        .with("priority", 14i64)
        .with("severity", 6i64)
        .with("tag", "diskmon")
        .with(
            "timestamp",
            DateTime::parse_from_rfc3339("2023-01-01T00:00:00Z").unwrap(),
        );
    validate(&record).unwrap()
}

#[tokio::test]
async fn test_publish_sends_canonical_json_under_topic() {
    let publisher = BrokerPublisher::new("broker", RecordingClient::default());

    let receipt = publisher.publish(TOPIC, &disk_usage_event()).await.unwrap();
    assert_eq!(receipt, PublishReceipt::Published);

    let sent = publisher.client().sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Syslog.1");
    assert_eq!(
        String::from_utf8(sent[0].1.clone()).unwrap(),
        r#"{"Client":"10.0.0.5:41000","Content":"disk usage high","Facility":1,"Hostname":"web-01","Priority":14,"Severity":6,"Tag":"diskmon","Timestamp":"2023-01-01T00:00:00Z"}"#
    );
}

#[tokio::test]
async fn test_publish_propagates_client_error() {
    let publisher = BrokerPublisher::new("broker", RefusingClient);

    let err = publisher
        .publish(TOPIC, &disk_usage_event())
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::Backend(_)));
    assert!(err.is_transient());
}

#[test]
fn test_name() {
    let publisher = BrokerPublisher::new("primary-broker", RefusingClient);
    assert_eq!(publisher.name(), "primary-broker");
}
