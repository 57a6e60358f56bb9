//! RFC 3164 datagram decoding
//!
//! Turns one datagram into a `RawRecord`. Fields the message does not carry
//! are left out rather than defaulted, so the validator can name them.

use std::net::SocketAddr;

use relay_protocol::RawRecord;
use relay_protocol::fields;
use syslog_loose::{Message, Variant};

/// Decode a syslog datagram received from `peer`
///
/// Never fails: `syslog_loose` falls back to treating unparseable input as
/// message content. Invalid UTF-8 is replaced lossily.
pub fn decode_datagram(data: &[u8], peer: SocketAddr) -> RawRecord {
    let text = String::from_utf8_lossy(trim_trailing_newline(data));
    let message = syslog_loose::parse_message(&text, Variant::RFC3164);
    to_record(&message, peer)
}

fn to_record(message: &Message<&str>, peer: SocketAddr) -> RawRecord {
    let mut record = RawRecord::new()
        .with(fields::CLIENT, peer.to_string())
        .with(fields::CONTENT, message.msg)
        .with(fields::TAG, message.appname.unwrap_or(""));

    if let (Some(facility), Some(severity)) = (message.facility, message.severity) {
        let facility = facility as i64;
        let severity = severity as i64;
        record.insert(fields::FACILITY, facility);
        record.insert(fields::SEVERITY, severity);
        record.insert(fields::PRIORITY, facility * 8 + severity);
    }

    if let Some(timestamp) = message.timestamp {
        record.insert(fields::TIMESTAMP, timestamp);
    }

    if let Some(hostname) = message.hostname {
        record.insert(fields::HOSTNAME, hostname);
    }

    record
}

/// Trim trailing newline from a datagram (LF or CRLF)
#[inline]
pub fn trim_trailing_newline(data: &[u8]) -> &[u8] {
    let mut end = data.len();

    if end > 0 && data[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && data[end - 1] == b'\r' {
            end -= 1;
        }
    }

    &data[..end]
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;
    use relay_protocol::{Value, validate};

    use super::*;

    fn peer() -> SocketAddr {
        "10.0.0.5:41000".parse().unwrap()
    }

    #[test]
    fn test_trim_trailing_newline() {
        assert_eq!(trim_trailing_newline(b"hello\n"), b"hello");
        assert_eq!(trim_trailing_newline(b"hello\r\n"), b"hello");
        assert_eq!(trim_trailing_newline(b"hello"), b"hello");
        assert_eq!(trim_trailing_newline(b"\r\n"), b"");
        assert_eq!(trim_trailing_newline(b""), b"");
        assert_eq!(trim_trailing_newline(b"a\nb\n"), b"a\nb");
    }

    #[test]
    fn test_decode_bsd_message() {
        let record = decode_datagram(
            b"<14>Jan  1 00:00:00 web-01 diskmon[812]: disk usage high\n",
            peer(),
        );

        assert_eq!(record.get("client"), Some(&Value::from("10.0.0.5:41000")));
        assert_eq!(record.get("hostname"), Some(&Value::from("web-01")));
        assert_eq!(record.get("tag"), Some(&Value::from("diskmon")));
        assert_eq!(record.get("content"), Some(&Value::from("disk usage high")));
        assert_eq!(record.get("facility"), Some(&Value::Integer(1)));
        assert_eq!(record.get("severity"), Some(&Value::Integer(6)));
        assert_eq!(record.get("priority"), Some(&Value::Integer(14)));

        let Some(Value::Timestamp(ts)) = record.get("timestamp") else {
            panic!("timestamp missing");
        };
        assert_eq!((ts.month(), ts.day()), (1, 1));

        let event = validate(&record).unwrap();
        assert_eq!(event.priority(), 14);
    }

    #[test]
    fn test_priority_combines_facility_and_severity() {
        // local4 (20) / warning (4)
        let record = decode_datagram(b"<164>Mar  5 12:30:00 db-02 postgres: slow query", peer());

        assert_eq!(record.get("facility"), Some(&Value::Integer(20)));
        assert_eq!(record.get("severity"), Some(&Value::Integer(4)));
        assert_eq!(record.get("priority"), Some(&Value::Integer(164)));
    }

    #[test]
    fn test_missing_pri_leaves_fields_out() {
        let record = decode_datagram(b"no header at all", peer());

        assert!(record.get("facility").is_none());
        assert!(record.get("severity").is_none());
        assert!(record.get("priority").is_none());
        assert!(record.get("client").is_some());

        let err = validate(&record).unwrap_err();
        assert!(err.contains("facility"));
    }

    #[test]
    fn test_ipv6_peer() {
        let peer: SocketAddr = "[::1]:5140".parse().unwrap();
        let record = decode_datagram(b"<14>Jan  1 00:00:00 web-01 app: x", peer);
        assert_eq!(record.get("client"), Some(&Value::from("[::1]:5140")));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let record = decode_datagram(b"<14>Jan  1 00:00:00 web-01 app: bad \xff byte", peer());
        let Some(Value::String(content)) = record.get("content") else {
            panic!("content missing");
        };
        assert!(content.contains('\u{FFFD}'));
    }
}
