//! Port for the push-change source feeding the reconciler.
//!
//! Delivery is assumed at-least-once and possibly out of order; consumers
//! must treat events purely as "something changed" triggers and reload from
//! the source of truth rather than trusting event payload content.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::define_port_error;

define_port_error! {
    /// Errors raised when establishing a change feed subscription.
    pub enum ChangeFeedError {
        /// The feed source is unreachable. Transient.
        Connection { message: String } => "change feed connection failed: {message}",
    }
}

/// Which collection a change event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// The questions collection.
    Questions,
    /// The answers collection.
    Answers,
}

/// Row-level operation reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    /// A row was inserted.
    Insert,
    /// A row was updated.
    Update,
    /// A row was deleted.
    Delete,
}

/// One change notification. Carries no row payload on purpose: the
/// reconciler reloads instead of patching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Affected collection.
    pub collection: Collection,
    /// Reported operation.
    pub op: ChangeOp,
}

/// A live subscription handing out change events.
///
/// Unsubscribing is idempotent and closes the event channel so the producer
/// side stops forwarding; dropping the subscription unsubscribes too.
#[derive(Debug)]
pub struct FeedSubscription {
    events: mpsc::Receiver<ChangeEvent>,
    active: Arc<AtomicBool>,
}

impl FeedSubscription {
    /// Build a subscription over a receiving channel.
    ///
    /// `active` is shared with the producing adapter so it can stop work
    /// once the consumer is gone.
    pub fn new(events: mpsc::Receiver<ChangeEvent>, active: Arc<AtomicBool>) -> Self {
        active.store(true, Ordering::Release);
        Self { events, active }
    }

    /// Wait for the next event; `None` once the feed closed or after
    /// unsubscribing.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Drain any event already queued without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }

    /// Stop receiving events. Safe to call any number of times.
    pub fn unsubscribe(&mut self) {
        if self.active.swap(false, Ordering::AcqRel) {
            self.events.close();
        }
    }

    /// Whether the subscription still receives events.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Port producing change feed subscriptions.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Open a new subscription.
    async fn subscribe(&self) -> Result<FeedSubscription, ChangeFeedError>;
}
