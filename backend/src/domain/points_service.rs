//! The points ledger: atomic, overdraft-safe transfers between users.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::points::{
    PointsTransfer, TRANSFER_STANDING_MINIMUM, TransferAmount, TransferError,
};
use crate::domain::ports::{PointsRepository, TransferBalances, UserRepository};
use crate::domain::subject_lock::SubjectLocks;
use crate::domain::user::{EmailAddress, UserId};

/// Outcome of a successful transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    /// The audit record that was appended.
    pub transfer: PointsTransfer,
    /// Both parties' balances after the move.
    pub balances: TransferBalances,
}

/// Transfers points between users.
///
/// Preconditions are checked before any mutation; the debit, the credit and
/// the audit append are one atomic repository call. Transfers from the same
/// sender serialise on the sender's keyed lock so two concurrent transfers
/// can never both pass the balance check against stale state.
pub struct PointsLedger {
    users: Arc<dyn UserRepository>,
    points: Arc<dyn PointsRepository>,
    locks: SubjectLocks,
    clock: Arc<dyn Clock>,
}

impl PointsLedger {
    /// Build a ledger over the given stores.
    pub fn new(
        users: Arc<dyn UserRepository>,
        points: Arc<dyn PointsRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            points,
            locks: SubjectLocks::new(),
            clock,
        }
    }

    /// Move `amount` points from `sender` to the account holding
    /// `recipient_email`.
    pub async fn transfer(
        &self,
        sender: &UserId,
        recipient_email: &EmailAddress,
        amount: u32,
    ) -> Result<TransferReceipt, TransferError> {
        let amount = TransferAmount::new(amount).map_err(|_| TransferError::AmountNotPositive)?;

        let recipient = self
            .users
            .find_by_email(recipient_email)
            .await
            .map_err(|err| TransferError::StoreUnavailable {
                message: err.to_string(),
            })?
            .ok_or(TransferError::RecipientNotFound)?;

        if recipient.id == *sender {
            return Err(TransferError::SelfTransfer);
        }

        // Everything from the balance read to the applied write runs under
        // the sender's lock.
        let _guard = self.locks.acquire(sender).await;

        let balance = self.points.balance_of(sender).await.map_err(|err| {
            TransferError::StoreUnavailable {
                message: err.to_string(),
            }
        })?;

        if balance < TRANSFER_STANDING_MINIMUM {
            return Err(TransferError::InsufficientStanding {
                available: balance,
                required: TRANSFER_STANDING_MINIMUM,
            });
        }
        if !balance.covers(amount) {
            return Err(TransferError::InsufficientAmount {
                available: balance,
                requested: amount,
            });
        }

        let transfer = PointsTransfer::record(*sender, recipient.id, amount, self.clock.utc());
        let balances = self.points.apply_transfer(&transfer).await.map_err(|err| {
            TransferError::StoreUnavailable {
                message: err.to_string(),
            }
        })?;

        info!(
            transfer = %transfer.id,
            from = %transfer.from_user,
            to = %transfer.to_user,
            amount = %transfer.amount,
            "points transferred"
        );
        Ok(TransferReceipt { transfer, balances })
    }
}
