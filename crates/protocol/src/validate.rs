//! Record validator
//!
//! The single translation point between the untyped `RawRecord` and the typed
//! `SyslogEvent`. Every required field is checked and every defect reported,
//! in canonical field order, so the error for a given input is deterministic.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::event::SyslogEvent;
use crate::record::{RawRecord, Value, ValueKind, fields};

/// Why a field failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefectReason {
    /// Field is absent from the record
    Missing,
    /// Field is present with the wrong dynamic type
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },
}

/// A single field defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefect {
    pub field: &'static str,
    pub reason: DefectReason,
}

impl fmt::Display for FieldDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            DefectReason::Missing => write!(f, "{}: missing", self.field),
            DefectReason::TypeMismatch { expected, found } => {
                write!(f, "{}: expected {}, found {}", self.field, expected, found)
            }
        }
    }
}

/// A record could not be converted into a `SyslogEvent`
///
/// Always holds at least one defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid syslog record: {}", DefectList(.defects))]
pub struct ValidationError {
    defects: Vec<FieldDefect>,
}

impl ValidationError {
    /// All defects, in canonical field order
    #[inline]
    pub fn defects(&self) -> &[FieldDefect] {
        &self.defects
    }

    /// The first defect found
    #[inline]
    pub fn first(&self) -> &FieldDefect {
        // never constructed empty, see validate()
        &self.defects[0]
    }

    /// Names of the offending fields
    pub fn fields(&self) -> Vec<&'static str> {
        self.defects.iter().map(|d| d.field).collect()
    }

    /// Whether `field` is among the defects
    pub fn contains(&self, field: &str) -> bool {
        self.defects.iter().any(|d| d.field == field)
    }
}

struct DefectList<'a>(&'a [FieldDefect]);

impl fmt::Display for DefectList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, defect) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", defect)?;
        }
        Ok(())
    }
}

/// Validate a raw record and convert it into a canonical event
///
/// Values are copied exactly; nothing is truncated, normalized or defaulted.
///
/// # Errors
///
/// Returns a `ValidationError` listing every missing or mistyped field.
pub fn validate(raw: &RawRecord) -> Result<SyslogEvent, ValidationError> {
    let mut defects = Vec::new();

    let client = string_field(raw, fields::CLIENT, &mut defects);
    let content = string_field(raw, fields::CONTENT, &mut defects);
    let facility = integer_field(raw, fields::FACILITY, &mut defects);
    let hostname = string_field(raw, fields::HOSTNAME, &mut defects);
    let priority = integer_field(raw, fields::PRIORITY, &mut defects);
    let severity = integer_field(raw, fields::SEVERITY, &mut defects);
    let tag = string_field(raw, fields::TAG, &mut defects);
    let timestamp = timestamp_field(raw, fields::TIMESTAMP, &mut defects);

    match (
        client, content, facility, hostname, priority, severity, tag, timestamp,
    ) {
        (
            Some(client),
            Some(content),
            Some(facility),
            Some(hostname),
            Some(priority),
            Some(severity),
            Some(tag),
            Some(timestamp),
        ) => Ok(SyslogEvent::new(
            client, content, facility, hostname, priority, severity, tag, timestamp,
        )),
        _ => Err(ValidationError { defects }),
    }
}

fn lookup<'a>(
    raw: &'a RawRecord,
    field: &'static str,
    expected: ValueKind,
    defects: &mut Vec<FieldDefect>,
) -> Option<&'a Value> {
    match raw.get(field) {
        Some(value) if value.kind() == expected => Some(value),
        Some(value) => {
            defects.push(FieldDefect {
                field,
                reason: DefectReason::TypeMismatch {
                    expected,
                    found: value.kind(),
                },
            });
            None
        }
        None => {
            defects.push(FieldDefect {
                field,
                reason: DefectReason::Missing,
            });
            None
        }
    }
}

fn string_field(
    raw: &RawRecord,
    field: &'static str,
    defects: &mut Vec<FieldDefect>,
) -> Option<String> {
    match lookup(raw, field, ValueKind::String, defects)? {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn integer_field(
    raw: &RawRecord,
    field: &'static str,
    defects: &mut Vec<FieldDefect>,
) -> Option<i64> {
    match lookup(raw, field, ValueKind::Integer, defects)? {
        Value::Integer(i) => Some(*i),
        _ => None,
    }
}

fn timestamp_field(
    raw: &RawRecord,
    field: &'static str,
    defects: &mut Vec<FieldDefect>,
) -> Option<DateTime<FixedOffset>> {
    match lookup(raw, field, ValueKind::Timestamp, defects)? {
        Value::Timestamp(ts) => Some(*ts),
        _ => None,
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;
