//! Inbound record queue
//!
//! Bounded single-consumer queue between a source and the ingest loop.
//! What happens when it is full depends on the `BackpressurePolicy`:
//!
//! - `Block`: `send` waits for the ingest loop to make room
//! - `DropNewest`: the incoming record is discarded, counted and logged
//!   through the `BackpressureTracker`
//!
//! Dropping the oldest queued record would need access to the receiving
//! side and is not offered.

use std::sync::Arc;

use relay_config::BackpressurePolicy;
use relay_protocol::RawRecord;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::metrics::{BackpressureTracker, IngestMetrics};

/// Result of offering a record to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Queue was full under `DropNewest`
    Dropped,
}

/// The ingest loop is gone; nothing will drain the queue again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("inbound queue closed")]
pub struct QueueClosed;

/// Create a bounded inbound queue
///
/// Drops are counted in `metrics`, normally the ingestor's own
/// (`Ingestor::metrics()`).
pub fn channel(
    capacity: usize,
    policy: BackpressurePolicy,
    metrics: Arc<IngestMetrics>,
) -> (RecordSender, RecordReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let sender = RecordSender {
        tx,
        policy,
        metrics,
        tracker: Arc::new(BackpressureTracker::new()),
    };
    (sender, RecordReceiver { rx })
}

/// Producer half of the inbound queue
#[derive(Debug, Clone)]
pub struct RecordSender {
    tx: mpsc::Sender<RawRecord>,
    policy: BackpressurePolicy,
    metrics: Arc<IngestMetrics>,
    tracker: Arc<BackpressureTracker>,
}

impl RecordSender {
    /// Offer a record to the ingest loop
    ///
    /// # Errors
    ///
    /// Returns `QueueClosed` once the receiver has been dropped.
    pub async fn send(&self, record: RawRecord) -> Result<Admission, QueueClosed> {
        match self.policy {
            BackpressurePolicy::Block => self
                .tx
                .send(record)
                .await
                .map(|()| Admission::Accepted)
                .map_err(|_| QueueClosed),
            BackpressurePolicy::DropNewest => match self.tx.try_send(record) {
                Ok(()) => Ok(Admission::Accepted),
                Err(TrySendError::Full(_)) => {
                    self.metrics.record_dropped();
                    self.tracker.record_drop();
                    Ok(Admission::Dropped)
                }
                Err(TrySendError::Closed(_)) => Err(QueueClosed),
            },
        }
    }

    pub fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    /// Whether the receiver has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of the inbound queue, owned by the ingest loop
#[derive(Debug)]
pub struct RecordReceiver {
    rx: mpsc::Receiver<RawRecord>,
}

impl RecordReceiver {
    /// Next record in FIFO order; `None` once every sender is dropped and
    /// the queue is drained
    pub async fn recv(&mut self) -> Option<RawRecord> {
        self.rx.recv().await
    }

    /// Stop accepting new records; queued ones can still be received
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: i64) -> RawRecord {
        RawRecord::new().with("seq", n)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let metrics = Arc::new(IngestMetrics::new());
        let (tx, mut rx) = channel(8, BackpressurePolicy::Block, metrics);

        for n in 0..5 {
            assert_eq!(tx.send(record(n)).await.unwrap(), Admission::Accepted);
        }
        drop(tx);

        let mut seen = Vec::new();
        while let Some(r) = rx.recv().await {
            seen.push(r);
        }
        assert_eq!(seen, (0..5).map(record).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_drop_newest_when_full() {
        let metrics = Arc::new(IngestMetrics::new());
        let (tx, mut rx) = channel(2, BackpressurePolicy::DropNewest, Arc::clone(&metrics));

        assert_eq!(tx.send(record(1)).await.unwrap(), Admission::Accepted);
        assert_eq!(tx.send(record(2)).await.unwrap(), Admission::Accepted);
        assert_eq!(tx.send(record(3)).await.unwrap(), Admission::Dropped);
        assert_eq!(tx.send(record(4)).await.unwrap(), Admission::Dropped);
        assert_eq!(metrics.snapshot().dropped, 2);

        // the queued records are the oldest ones
        assert_eq!(rx.recv().await, Some(record(1)));
        assert_eq!(rx.recv().await, Some(record(2)));

        // room again
        assert_eq!(tx.send(record(5)).await.unwrap(), Admission::Accepted);
        assert_eq!(rx.recv().await, Some(record(5)));
    }

    #[tokio::test]
    async fn test_block_waits_for_room() {
        let metrics = Arc::new(IngestMetrics::new());
        let (tx, mut rx) = channel(1, BackpressurePolicy::Block, Arc::clone(&metrics));

        tx.send(record(1)).await.unwrap();

        let producer = tokio::spawn({
            let tx = tx.clone();
            async move { tx.send(record(2)).await }
        });
        tokio::task::yield_now().await;
        assert!(!producer.is_finished());

        assert_eq!(rx.recv().await, Some(record(1)));
        assert_eq!(producer.await.unwrap(), Ok(Admission::Accepted));
        assert_eq!(rx.recv().await, Some(record(2)));
        assert_eq!(metrics.snapshot().dropped, 0);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        for policy in [BackpressurePolicy::Block, BackpressurePolicy::DropNewest] {
            let (tx, rx) = channel(4, policy, Arc::new(IngestMetrics::new()));
            drop(rx);

            assert!(tx.is_closed());
            assert_eq!(tx.send(record(1)).await, Err(QueueClosed));
        }
    }

    #[tokio::test]
    async fn test_close_keeps_queued_records() {
        for policy in [BackpressurePolicy::Block, BackpressurePolicy::DropNewest] {
            let (tx, mut rx) = channel(4, policy, Arc::new(IngestMetrics::new()));
            tx.send(record(1)).await.unwrap();
            tx.send(record(2)).await.unwrap();

            rx.close();
            assert!(tx.is_closed());
            assert_eq!(tx.send(record(3)).await, Err(QueueClosed));

            assert_eq!(rx.recv().await, Some(record(1)));
            assert_eq!(rx.recv().await, Some(record(2)));
            assert_eq!(rx.recv().await, None);
        }
    }
}
