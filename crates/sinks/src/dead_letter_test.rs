//! Tests for dead-letter sinks

use chrono::DateTime;
use relay_config::{DeadLetterConfig, FileDeadLetterConfig};
use relay_protocol::{RawRecord, SyslogEvent, TOPIC, validate};

use super::*;
use crate::publisher::PublishError;

fn event(content: &str) -> SyslogEvent {
    let record = RawRecord::new()
        .with("client", "10.0.0.5:41000")
        .with("content", content)
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

#[test]
fn test_envelope_json() {
    let error = PublishError::Backend("broker unavailable".into());
    let letter = DeadLetter::new(TOPIC, &error, 4, event("disk usage high"));

    let json: serde_json::Value = serde_json::from_str(&letter.to_json().unwrap()).unwrap();
    assert_eq!(json["topic"], "Syslog.1");
    assert_eq!(json["error"], "backend error: broker unavailable");
    assert_eq!(json["attempts"], 4);
    assert!(json["failed_at"].as_str().unwrap().ends_with('Z'));
    assert_eq!(json["event"]["Hostname"], "web-01");
    assert_eq!(json["event"]["Timestamp"], "2023-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_file_sink_appends_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/dir/dead.jsonl");

    let sink = FileDeadLetter::open(&path).await.unwrap();
    assert_eq!(sink.path(), path);
    let error = PublishError::Timeout(std::time::Duration::from_secs(5));
    sink.write(&DeadLetter::new(TOPIC, &error, 1, event("first")))
        .await
        .unwrap();
    sink.write(&DeadLetter::new(TOPIC, &error, 1, event("second")))
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let letters: Vec<DeadLetter> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(letters.len(), 2);
    assert_eq!(letters[0].event.content(), "first");
    assert_eq!(letters[1].event.content(), "second");
    assert_eq!(letters[1].error, "publish timed out after 5s");
}

#[tokio::test]
async fn test_file_sink_keeps_existing_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dead.jsonl");
    std::fs::write(&path, "previous\n").unwrap();

    let sink = FileDeadLetter::open(&path).await.unwrap();
    let error = PublishError::Backend("down".into());
    sink.write(&DeadLetter::new(TOPIC, &error, 2, event("x")))
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("previous\n"));
    assert_eq!(contents.lines().count(), 2);
}

#[tokio::test]
async fn test_file_sink_open_failure() {
    let dir = tempfile::tempdir().unwrap();
    // a regular file cannot be a parent directory
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let err = FileDeadLetter::open(blocker.join("dead.jsonl"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DeadLetterError::Io { .. }));
}

#[tokio::test]
async fn test_log_sink_succeeds() {
    let error = PublishError::Backend("down".into());
    let letter = DeadLetter::new(TOPIC, &error, 1, event("x"));
    assert!(LogDeadLetter.write(&letter).await.is_ok());
}

#[tokio::test]
async fn test_open_from_config() {
    let sink = open_dead_letter(&DeadLetterConfig::Log).await.unwrap();
    assert_eq!(sink.name(), "log");

    let dir = tempfile::tempdir().unwrap();
    let config = DeadLetterConfig::File(FileDeadLetterConfig {
        path: dir.path().join("dl.jsonl"),
    });
    let sink = open_dead_letter(&config).await.unwrap();
    assert_eq!(sink.name(), "file");
}
