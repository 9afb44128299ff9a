//! In-process change feed adapter.
//!
//! Implements the domain's `ChangeFeed` port over a Tokio broadcast
//! channel. The write-side persistence adapters publish a row-level event
//! after each successful commit; the reconciler subscribes. Delivery is
//! at-least-once from the consumer's point of view: a lagging subscriber
//! gets a synthetic event instead of the ones it missed, which is
//! sufficient because consumers reload rather than trust payloads.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::domain::ports::{
    ChangeEvent, ChangeFeed, ChangeFeedError, ChangeOp, Collection, FeedSubscription,
};

/// Events buffered per subscriber before the bridge applies backpressure.
const SUBSCRIBER_BUFFER: usize = 64;

/// Write side handed to persistence adapters.
pub trait FeedPublisher: Send + Sync {
    /// Announce a row-level change. Never fails; an event with no listeners
    /// is simply dropped.
    fn publish(&self, event: ChangeEvent);
}

/// Broadcast-backed change feed.
#[derive(Debug)]
pub struct BroadcastChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastChangeFeed {
    /// Create a feed with the given broadcast capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl FeedPublisher for BroadcastChangeFeed {
    fn publish(&self, event: ChangeEvent) {
        if self.tx.send(event).is_err() {
            debug!(?event, "change event dropped: no subscribers");
        }
    }
}

#[async_trait]
impl ChangeFeed for BroadcastChangeFeed {
    async fn subscribe(&self) -> Result<FeedSubscription, ChangeFeedError> {
        let mut source = self.tx.subscribe();
        let (forward, events) = mpsc::channel(SUBSCRIBER_BUFFER);
        let subscription = FeedSubscription::new(events, Arc::new(AtomicBool::new(false)));

        // Bridge task: forwards broadcast events into the subscription's
        // channel and stops once the subscriber is gone.
        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(event) => {
                        if forward.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change feed subscriber lagged; events dropped");
                        // The consumer reloads from source on any event, so
                        // one stand-in covers everything that was missed.
                        let stand_in = ChangeEvent {
                            collection: Collection::Questions,
                            op: ChangeOp::Update,
                        };
                        if forward.send(stand_in).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(op: ChangeOp) -> ChangeEvent {
        ChangeEvent {
            collection: Collection::Answers,
            op,
        }
    }

    #[tokio::test]
    async fn published_events_reach_subscribers() {
        let feed = BroadcastChangeFeed::default();
        let mut subscription = feed.subscribe().await.expect("subscribe");

        feed.publish(event(ChangeOp::Insert));
        let received = subscription.next_event().await.expect("event arrives");
        assert_eq!(received, event(ChangeOp::Insert));
    }

    #[tokio::test]
    async fn each_subscriber_sees_every_event() {
        let feed = BroadcastChangeFeed::default();
        let mut first = feed.subscribe().await.expect("subscribe");
        let mut second = feed.subscribe().await.expect("subscribe");

        feed.publish(event(ChangeOp::Delete));
        assert_eq!(
            first.next_event().await.expect("event"),
            event(ChangeOp::Delete)
        );
        assert_eq!(
            second.next_event().await.expect("event"),
            event(ChangeOp::Delete)
        );
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_harmless() {
        let feed = BroadcastChangeFeed::default();
        feed.publish(event(ChangeOp::Insert));
    }

    #[tokio::test]
    async fn unsubscribed_consumers_stop_receiving() {
        let feed = BroadcastChangeFeed::default();
        let mut subscription = feed.subscribe().await.expect("subscribe");
        subscription.unsubscribe();

        feed.publish(event(ChangeOp::Insert));
        assert_eq!(subscription.next_event().await, None);
    }
}
