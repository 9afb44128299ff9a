//! Port for the opaque secret-delivery channel (email/SMS).
//!
//! The transport is explicitly out of scope for this service; the default
//! adapter only records that a delivery was handed off.

use async_trait::async_trait;
use tracing::info;

use crate::domain::password_reset::GeneratedPassword;
use crate::domain::user::UserId;
use crate::domain::verification::OneTimeCode;

/// Port handing secrets to the external delivery mechanism.
///
/// Like notifications, delivery is fire-and-forget from the core's point of
/// view: a lost email must not fail the action that produced the secret.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Hand off a one-time code for delivery to the user.
    async fn deliver_code(&self, recipient: &UserId, code: &OneTimeCode);

    /// Hand off a generated password for delivery to the user.
    async fn deliver_password(&self, recipient: &UserId, password: &GeneratedPassword);
}

/// Default adapter: logs the hand-off without the secret itself.
#[derive(Debug, Default)]
pub struct LoggingDeliveryChannel;

#[async_trait]
impl DeliveryChannel for LoggingDeliveryChannel {
    async fn deliver_code(&self, recipient: &UserId, _code: &OneTimeCode) {
        info!(user = %recipient, "one-time code handed to delivery channel");
    }

    async fn deliver_password(&self, recipient: &UserId, _password: &GeneratedPassword) {
        info!(user = %recipient, "generated password handed to delivery channel");
    }
}
