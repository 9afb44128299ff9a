//! PostgreSQL-backed `PointsRepository` implementation using Diesel ORM.
//!
//! `apply_transfer` runs the debit, the credit, and the audit append inside
//! one database transaction. The debit statement carries its own balance
//! guard, so even a caller bypassing the ledger's per-sender lock cannot
//! drive a balance negative.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::points::{Points, PointsTransfer};
use crate::domain::ports::{
    PointsRepository, PointsRepositoryError, TransferBalances,
};
use crate::domain::user::UserId;

use super::diesel_helpers::StoreFault;
use super::models::NewPointsTransferRow;
use super::pool::DbPool;
use super::schema::{points_transfers, users};

/// Diesel-backed implementation of the `PointsRepository` port.
#[derive(Clone)]
pub struct DieselPointsRepository {
    pool: DbPool,
}

impl DieselPointsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_fault(fault: StoreFault) -> PointsRepositoryError {
    match fault {
        StoreFault::Connection(message) => PointsRepositoryError::connection(message),
        StoreFault::Query(message) | StoreFault::MissingParent(message) => {
            PointsRepositoryError::query(message)
        }
    }
}

fn amount_for_db(amount: u32) -> Result<i32, StoreFault> {
    i32::try_from(amount)
        .map_err(|_| StoreFault::Query(format!("transfer amount {amount} exceeds storage range")))
}

fn points_from_db(points: i32) -> Result<Points, StoreFault> {
    u32::try_from(points)
        .map(Points::new)
        .map_err(|_| StoreFault::Query(format!("negative points balance in database: {points}")))
}

#[async_trait]
impl PointsRepository for DieselPointsRepository {
    async fn balance_of(&self, user: &UserId) -> Result<Points, PointsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let balance: Option<i32> = users::table
            .filter(users::id.eq(user.as_uuid()))
            .select(users::points)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        match balance {
            Some(points) => points_from_db(points).map_err(map_fault),
            None => Err(PointsRepositoryError::query("account missing")),
        }
    }

    async fn apply_transfer(
        &self,
        transfer: &PointsTransfer,
    ) -> Result<TransferBalances, PointsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let amount = amount_for_db(transfer.amount.value()).map_err(map_fault)?;
        let row = NewPointsTransferRow {
            id: *transfer.id.as_uuid(),
            from_user_id: *transfer.from_user.as_uuid(),
            to_user_id: *transfer.to_user.as_uuid(),
            amount,
            created_at: transfer.created_at,
        };

        let balances = conn
            .transaction::<TransferBalances, StoreFault, _>(|conn| {
                async move {
                    let sender_after: Option<i32> = diesel::update(
                        users::table
                            .filter(users::id.eq(row.from_user_id))
                            .filter(users::points.ge(amount)),
                    )
                    .set(users::points.eq(users::points - amount))
                    .returning(users::points)
                    .get_result(conn)
                    .await
                    .optional()?;
                    let Some(sender_after) = sender_after else {
                        return Err(StoreFault::Query(
                            "sender balance changed underneath the transfer".to_owned(),
                        ));
                    };

                    let recipient_after: i32 = diesel::update(
                        users::table.filter(users::id.eq(row.to_user_id)),
                    )
                    .set(users::points.eq(users::points + amount))
                    .returning(users::points)
                    .get_result(conn)
                    .await?;

                    diesel::insert_into(points_transfers::table)
                        .values(&row)
                        .execute(conn)
                        .await?;

                    Ok(TransferBalances {
                        sender: points_from_db(sender_after)?,
                        recipient: points_from_db(recipient_after)?,
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(map_fault)?;

        Ok(balances)
    }
}
