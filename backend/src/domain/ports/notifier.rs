//! Ports for fire-and-forget user notifications: the publishing side used
//! by actions, and the subscribing side used by session adapters.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::user::UserId;

/// A (title, body) pair shown to the recipient's active sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short headline.
    pub title: String,
    /// Message body.
    pub body: String,
}

impl Notification {
    /// Build a notification.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Port delivering notifications best-effort.
///
/// Delivery failures are swallowed by implementations and never surfaced to
/// the action that triggered them; the method is therefore infallible.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver to whatever sessions the recipient currently has, if any.
    async fn notify(&self, recipient: &UserId, notification: Notification);
}

/// Subscribe side of the notification channel.
///
/// A session adapter subscribes for its authenticated user and forwards
/// whatever arrives; a receiver that lags simply misses notifications.
pub trait NotificationSource: Send + Sync {
    /// Open a receiver for one user's notifications.
    fn subscribe(&self, user: &UserId) -> broadcast::Receiver<Notification>;
}

/// Fixture implementation that drops every notification and hands out
/// receivers nothing is ever sent to.
#[derive(Debug, Default)]
pub struct FixtureNotifier;

#[async_trait]
impl Notifier for FixtureNotifier {
    async fn notify(&self, _recipient: &UserId, _notification: Notification) {}
}

impl NotificationSource for FixtureNotifier {
    fn subscribe(&self, _user: &UserId) -> broadcast::Receiver<Notification> {
        broadcast::channel(1).1
    }
}
