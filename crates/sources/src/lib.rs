//! Relay - Sources
//!
//! Network sources that receive syslog traffic and produce `RawRecord`s for
//! the ingest loop.
//!
//! # Available Sources
//!
//! - **Syslog UDP** - RFC 3164 syslog over UDP
//!
//! # Design Principles
//!
//! - **Decode only**: sources map wire fields onto a `RawRecord`; typing and
//!   required-field checks belong to the validator
//! - **Backpressure**: records go through a `RecordSender`, which blocks or
//!   drops per the configured policy
//! - **Cancellation**: `run` takes a `CancellationToken`; returning drops the
//!   sender so the ingest loop can drain
//!
//! # Example
//!
//! ```ignore
//! use relay_sources::SyslogUdpSource;
//!
//! let source = SyslogUdpSource::bind(&config.source)?;
//! let (tx, rx) = relay_pipeline::channel(
//!     config.source.queue_size,
//!     config.source.backpressure,
//!     ingestor.metrics(),
//! );
//! tokio::spawn(source.run(tx, cancel.child_token()));
//! ```

pub mod syslog;

pub use syslog::{
    SyslogUdpMetricsHandle, SyslogUdpSource, SyslogUdpSourceError, SyslogUdpSourceMetrics,
    decode_datagram,
};
