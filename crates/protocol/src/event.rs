//! Canonical syslog event
//!
//! `SyslogEvent` is the typed value the pipeline exists to produce. Its JSON
//! form is the broker wire format for topic `Syslog.1`:
//!
//! ```text
//! {"Client":"10.0.0.5:41000","Content":"disk usage high","Facility":1,
//!  "Hostname":"web-01","Priority":14,"Severity":6,"Tag":"diskmon",
//!  "Timestamp":"2023-01-01T00:00:00Z"}
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Topic identifier for schema version 1 of the syslog event
pub const TOPIC: &str = "Syslog.1";

/// Canonical, immutable syslog event
///
/// Only built by the validator (or by decoding its own JSON form), so a
/// value of this type always carries all eight fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SyslogEvent {
    client: String,
    content: String,
    facility: i64,
    hostname: String,
    priority: i64,
    severity: i64,
    tag: String,
    #[serde(with = "rfc3339")]
    timestamp: DateTime<FixedOffset>,
}

impl SyslogEvent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        client: String,
        content: String,
        facility: i64,
        hostname: String,
        priority: i64,
        severity: i64,
        tag: String,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            client,
            content,
            facility,
            hostname,
            priority,
            severity,
            tag,
            timestamp,
        }
    }

    /// Source address/identity of the sender
    #[inline]
    pub fn client(&self) -> &str {
        &self.client
    }

    /// Message body (may be empty)
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[inline]
    pub fn facility(&self) -> i64 {
        self.facility
    }

    #[inline]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    #[inline]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    #[inline]
    pub fn severity(&self) -> i64 {
        self.severity
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Event time as reported by the sender
    #[inline]
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Serialize to the canonical JSON wire form
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decode the canonical JSON wire form
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// RFC3339 with `Z` for a zero offset and sub-second digits only when present
mod rfc3339 {
    use chrono::{DateTime, FixedOffset, SecondsFormat};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)
    }
}
