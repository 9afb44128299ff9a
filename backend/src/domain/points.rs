//! Engagement points: balances, transfer amounts, and the audit record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::user::UserId;

/// A sender must hold at least this many points to initiate any transfer,
/// independent of the amount moved.
pub const TRANSFER_STANDING_MINIMUM: Points = Points::new(10);

/// Non-negative points balance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Points(u32);

impl Points {
    /// Wrap a raw count.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw count.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Balance after receiving `amount`, saturating at the type limit.
    pub const fn credit(self, amount: TransferAmount) -> Self {
        Self(self.0.saturating_add(amount.value()))
    }

    /// Balance after sending `amount`, or `None` if it would go negative.
    pub const fn debit(self, amount: TransferAmount) -> Option<Self> {
        match self.0.checked_sub(amount.value()) {
            Some(rest) => Some(Self(rest)),
            None => None,
        }
    }

    /// Whether this balance covers `amount`.
    pub const fn covers(self, amount: TransferAmount) -> bool {
        self.0 >= amount.value()
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly positive number of points moved by a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TransferAmount(u32);

/// Error raised when a transfer amount is not strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("transfer amount must be positive")]
pub struct AmountNotPositiveError;

impl TransferAmount {
    /// Validate and construct a [`TransferAmount`].
    pub const fn new(value: u32) -> Result<Self, AmountNotPositiveError> {
        if value == 0 {
            Err(AmountNotPositiveError)
        } else {
            Ok(Self(value))
        }
    }

    /// Raw count.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TransferAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TransferAmount> for u32 {
    fn from(value: TransferAmount) -> Self {
        value.0
    }
}

impl TryFrom<u32> for TransferAmount {
    type Error = AmountNotPositiveError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Identifier of a points transfer audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Append-only audit record of one points transfer.
///
/// ## Invariants
/// - Exists if and only if the corresponding balance mutations were applied;
///   the repository writes all three in one atomic unit.
/// - Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsTransfer {
    /// Audit row identifier.
    pub id: TransferId,
    /// Sending user.
    pub from_user: UserId,
    /// Receiving user.
    pub to_user: UserId,
    /// Points moved; always positive.
    pub amount: TransferAmount,
    /// When the transfer was applied.
    pub created_at: DateTime<Utc>,
}

impl PointsTransfer {
    /// Build a fresh transfer record ready for the repository.
    pub fn record(
        from_user: UserId,
        to_user: UserId,
        amount: TransferAmount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransferId::random(),
            from_user,
            to_user,
            amount,
            created_at,
        }
    }
}

/// Reasons the ledger refuses a transfer.
///
/// Every variant implies a different corrective action for the caller, so the
/// ledger never collapses them into a generic failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The requested amount was zero.
    #[error("transfer amount must be positive")]
    AmountNotPositive,
    /// Sender and recipient are the same account.
    #[error("points cannot be transferred to yourself")]
    SelfTransfer,
    /// No account matches the recipient address.
    #[error("recipient not found")]
    RecipientNotFound,
    /// The sender holds fewer points than the standing minimum.
    #[error("a balance of at least {required} points is needed to transfer (you have {available})")]
    InsufficientStanding {
        /// Sender's current balance.
        available: Points,
        /// The standing minimum.
        required: Points,
    },
    /// The sender's balance does not cover the requested amount.
    #[error("insufficient points: balance {available} does not cover {requested}")]
    InsufficientAmount {
        /// Sender's current balance.
        available: Points,
        /// Points requested.
        requested: TransferAmount,
    },
    /// The backing store could not complete the operation. Retryable.
    #[error("points store unavailable: {message}")]
    StoreUnavailable {
        /// Adapter-provided context.
        message: String,
    },
}

impl TransferError {
    /// Short machine-readable reason tag carried in error payloads.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::AmountNotPositive => "amount_not_positive",
            Self::SelfTransfer => "self_transfer",
            Self::RecipientNotFound => "recipient_not_found",
            Self::InsufficientStanding { .. } => "insufficient_standing",
            Self::InsufficientAmount { .. } => "insufficient_amount",
            Self::StoreUnavailable { .. } => "store_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn amounts_must_be_positive() {
        assert!(TransferAmount::new(0).is_err());
        assert_eq!(TransferAmount::new(1).map(TransferAmount::value), Ok(1));
    }

    #[rstest]
    fn debit_refuses_overdraft() {
        let balance = Points::new(5);
        let amount = TransferAmount::new(6).expect("positive");
        assert_eq!(balance.debit(amount), None);
    }

    #[rstest]
    fn debit_and_credit_conserve_points() {
        let sender = Points::new(15);
        let recipient = Points::new(0);
        let amount = TransferAmount::new(10).expect("positive");

        let sender_after = sender.debit(amount).expect("covered");
        let recipient_after = recipient.credit(amount);

        assert_eq!(
            sender.value() + recipient.value(),
            sender_after.value() + recipient_after.value()
        );
    }

    #[rstest]
    fn reason_tags_are_stable() {
        let err = TransferError::InsufficientStanding {
            available: Points::new(9),
            required: TRANSFER_STANDING_MINIMUM,
        };
        assert_eq!(err.reason(), "insufficient_standing");
    }
}
