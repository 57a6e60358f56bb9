//! Relay Protocol - Records and events that flow through the pipeline
//!
//! This crate provides the foundational types of the relay:
//! - `RawRecord` - Untyped field map produced per syslog datagram
//! - `SyslogEvent` - Canonical, immutable, fully-typed event
//! - `validate` - The only conversion from the former to the latter
//! - `TOPIC` - Publish topic for version 1 of the event schema
//!
//! # Design Principles
//!
//! - **Narrow boundary**: untyped data never leaves this crate's validator
//! - **All-or-nothing**: an event cannot exist with a missing or mistyped field
//! - **Deterministic errors**: defects are reported in canonical field order
//!
//! # Example
//!
//! ```
//! use chrono::DateTime;
//! use relay_protocol::{RawRecord, validate};
//!
//! let ts = DateTime::parse_from_rfc3339("2023-01-01T00:00:00Z").unwrap();
//! let record = RawRecord::new()
//!     .with("client", "10.0.0.5:41000")
//!     .with("content", "disk usage high")
//!     .with("facility", 1i64)
//!     .with("hostname", "web-01")
//!     .with("priority", 14i64)
//!     .with("severity", 6i64)
//!     .with("tag", "diskmon")
//!     .with("timestamp", ts);
//!
//! let event = validate(&record).unwrap();
//! assert_eq!(event.hostname(), "web-01");
//! ```

mod event;
mod record;
mod validate;

pub use event::{SyslogEvent, TOPIC};
pub use record::{RawRecord, Value, ValueKind, fields};
pub use validate::{DefectReason, FieldDefect, ValidationError, validate};
