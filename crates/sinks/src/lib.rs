//! Relay - Sinks
//!
//! Delivery backends for canonical syslog events.
//!
//! # Architecture
//!
//! The ingest loop talks to a single `Arc<dyn Publisher>`. Two adapters
//! implement it over narrower backend traits:
//!
//! ```text
//! [Ingestor] --&SyslogEvent--> [BrokerPublisher<C>] --JSON bytes--> [BrokerClient]
//!                          \-> [StorePublisher<S>] --event-------> [EventStore]
//! ```
//!
//! | Backend | Trait | Receipt |
//! |---------|-------|---------|
//! | `TcpBroker` | `BrokerClient` | `Published` |
//! | `ClickHouseStore` | `EventStore` | `Stored { id }` |
//!
//! Records that cannot be delivered go to a `DeadLetterSink` (log or file).

pub mod broker;
pub mod dead_letter;
mod publisher;
pub mod store;

pub use broker::{BrokerClient, BrokerPublisher, TcpBroker};
pub use dead_letter::{
    DeadLetter, DeadLetterError, DeadLetterSink, FileDeadLetter, LogDeadLetter, open_dead_letter,
};
pub use publisher::{PublishError, PublishReceipt, Publisher};
pub use store::{ClickHouseStore, EventStore, StorePublisher};

use std::sync::Arc;

use relay_config::PublisherConfig;

/// Build the publisher selected by configuration
pub fn build_publisher(config: &PublisherConfig) -> Arc<dyn Publisher> {
    match config {
        PublisherConfig::Broker(broker) => {
            Arc::new(BrokerPublisher::new("broker", TcpBroker::new(broker)))
        }
        PublisherConfig::Store(store) => {
            Arc::new(StorePublisher::new("store", ClickHouseStore::new(store)))
        }
    }
}
