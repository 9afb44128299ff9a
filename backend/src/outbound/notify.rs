//! In-process notification adapter.
//!
//! Implements the domain's `Notifier` port over per-user broadcast
//! channels. WebSocket sessions subscribe for their user; actions publish.
//! Losing a notification (no sessions, lagging session, closed channel) is
//! by contract invisible to the publishing action.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{Notification, NotificationSource, Notifier};
use crate::domain::user::UserId;

/// Notifications buffered per user before old ones are overwritten.
const USER_BUFFER: usize = 16;

/// Per-user broadcast notifier.
#[derive(Debug, Default)]
pub struct SessionNotifier {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<Notification>>>,
}

impl SessionNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

}

impl NotificationSource for SessionNotifier {
    fn subscribe(&self, user: &UserId) -> broadcast::Receiver<Notification> {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        channels
            .entry(*user.as_uuid())
            .or_insert_with(|| broadcast::channel(USER_BUFFER).0)
            .subscribe()
    }
}

#[async_trait]
impl Notifier for SessionNotifier {
    async fn notify(&self, recipient: &UserId, notification: Notification) {
        let sender = {
            let channels = self
                .channels
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            channels.get(recipient.as_uuid()).cloned()
        };

        match sender {
            Some(sender) => {
                if sender.send(notification).is_err() {
                    debug!(user = %recipient, "notification dropped: no live sessions");
                }
            }
            None => {
                debug!(user = %recipient, "notification dropped: user never connected");
            }
        }
    }
}
