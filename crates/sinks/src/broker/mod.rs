//! Broker publisher
//!
//! Serializes each event to its canonical JSON form and hands the bytes to a
//! `BrokerClient` under the event topic. Brokers do not acknowledge with an
//! identifier, so success is always `PublishReceipt::Published`.

mod tcp;

pub use tcp::{TcpBroker, encode_frame};

use async_trait::async_trait;
use relay_protocol::SyslogEvent;

use crate::publisher::{PublishError, PublishReceipt, Publisher};

/// Transport to a topic-addressed message broker
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Deliver one payload under `topic`
    async fn send(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// `Publisher` adapter over a `BrokerClient`
pub struct BrokerPublisher<C> {
    name: String,
    client: C,
}

impl<C: BrokerClient> BrokerPublisher<C> {
    pub fn new(name: impl Into<String>, client: C) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    /// Access the underlying client
    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: BrokerClient> Publisher for BrokerPublisher<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(
        &self,
        topic: &str,
        event: &SyslogEvent,
    ) -> Result<PublishReceipt, PublishError> {
        let payload = event.to_json()?;
        self.client.send(topic, &payload).await?;
        Ok(PublishReceipt::Published)
    }
}

#[cfg(test)]
#[path = "broker_test.rs"]
mod broker_test;
