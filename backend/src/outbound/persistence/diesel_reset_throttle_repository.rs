//! PostgreSQL-backed `ResetThrottleRepository` implementation using Diesel
//! ORM.
//!
//! Throttle state lives on the `users` row (`password_reset_count`,
//! `password_reset_at`); each load and store is a single statement.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    ResetThrottleRepository, ResetThrottleRepositoryError, ResetThrottleState,
};
use crate::domain::user::UserId;

use super::diesel_helpers::StoreFault;
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `ResetThrottleRepository` port.
#[derive(Clone)]
pub struct DieselResetThrottleRepository {
    pool: DbPool,
}

impl DieselResetThrottleRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_fault(fault: StoreFault) -> ResetThrottleRepositoryError {
    match fault {
        StoreFault::Connection(message) => ResetThrottleRepositoryError::connection(message),
        StoreFault::Query(message) | StoreFault::MissingParent(message) => {
            ResetThrottleRepositoryError::query(message)
        }
    }
}

fn count_from_db(count: i32) -> Result<u32, ResetThrottleRepositoryError> {
    u32::try_from(count).map_err(|_| {
        ResetThrottleRepositoryError::query(format!("negative reset count in database: {count}"))
    })
}

fn count_for_db(count: u32) -> Result<i32, ResetThrottleRepositoryError> {
    i32::try_from(count).map_err(|_| {
        ResetThrottleRepositoryError::query(format!("reset count {count} exceeds storage range"))
    })
}

#[async_trait]
impl ResetThrottleRepository for DieselResetThrottleRepository {
    async fn load(
        &self,
        subject: &UserId,
    ) -> Result<ResetThrottleState, ResetThrottleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let row: Option<(i32, Option<chrono::DateTime<chrono::Utc>>)> = users::table
            .filter(users::id.eq(subject.as_uuid()))
            .select((users::password_reset_count, users::password_reset_at))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        let Some((count, last_reset)) = row else {
            return Err(ResetThrottleRepositoryError::unknown_subject(
                subject.to_string(),
            ));
        };
        Ok(ResetThrottleState {
            count: count_from_db(count)?,
            last_reset,
        })
    }

    async fn store(
        &self,
        subject: &UserId,
        state: ResetThrottleState,
    ) -> Result<(), ResetThrottleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let updated = diesel::update(users::table.filter(users::id.eq(subject.as_uuid())))
            .set((
                users::password_reset_count.eq(count_for_db(state.count)?),
                users::password_reset_at.eq(state.last_reset),
            ))
            .execute(&mut conn)
            .await
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        if updated == 0 {
            return Err(ResetThrottleRepositoryError::unknown_subject(
                subject.to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn count_conversions_guard_both_directions() {
        assert_eq!(count_from_db(1).expect("valid"), 1);
        assert!(count_from_db(-1).is_err());
        assert_eq!(count_for_db(1).expect("valid"), 1);
        assert!(count_for_db(u32::MAX).is_err());
    }
}
