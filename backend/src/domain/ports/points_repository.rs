//! Port for points balances and the atomic transfer write.

use async_trait::async_trait;

use crate::domain::points::{Points, PointsTransfer};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by points repository adapters.
    pub enum PointsRepositoryError {
        /// Store connection could not be established. Transient.
        Connection { message: String } => "points store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "points store query failed: {message}",
    }
}

/// Balances of both parties after a transfer was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferBalances {
    /// Sender's balance after the debit.
    pub sender: Points,
    /// Recipient's balance after the credit.
    pub recipient: Points,
}

/// Port for the points side of the store.
///
/// `apply_transfer` is the single atomic unit the ledger relies on: the
/// debit, the credit, and the audit row append all happen or none do.
/// Adapters must additionally refuse a debit that would take the sender
/// negative, even though the ledger pre-checks under its per-sender lock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointsRepository: Send + Sync {
    /// Current balance of a user.
    async fn balance_of(&self, user: &UserId) -> Result<Points, PointsRepositoryError>;

    /// Atomically debit the sender, credit the recipient, and append the
    /// audit record.
    async fn apply_transfer(
        &self,
        transfer: &PointsTransfer,
    ) -> Result<TransferBalances, PointsRepositoryError>;
}

/// Fixture implementation for tests that do not exercise the ledger.
#[derive(Debug, Default)]
pub struct FixturePointsRepository;

#[async_trait]
impl PointsRepository for FixturePointsRepository {
    async fn balance_of(&self, _user: &UserId) -> Result<Points, PointsRepositoryError> {
        Ok(Points::new(0))
    }

    async fn apply_transfer(
        &self,
        transfer: &PointsTransfer,
    ) -> Result<TransferBalances, PointsRepositoryError> {
        Ok(TransferBalances {
            sender: Points::new(0),
            recipient: Points::new(transfer.amount.value()),
        })
    }
}
