//! Relay - syslog ingestion service
//!
//! Listens for RFC 3164 syslog over UDP, validates each record into a
//! canonical event and publishes it to a broker or event store, reporting
//! throughput as it goes.
//!
//! The binary (`relay`) loads configuration and calls [`Relay::build`]; tests
//! use [`Relay::with_backends`] to swap in their own publisher.

mod app;

pub use app::Relay;
