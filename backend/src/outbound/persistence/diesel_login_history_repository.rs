//! PostgreSQL-backed `LoginHistoryRepository` implementation using Diesel
//! ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::login_history::{DeviceClass, LoginHistoryEntry};
use crate::domain::ports::{LoginHistoryRepository, LoginHistoryRepositoryError};
use crate::domain::user::UserId;

use super::diesel_helpers::StoreFault;
use super::models::{LoginHistoryRow, NewLoginHistoryRow};
use super::pool::DbPool;
use super::schema::login_history;

/// Diesel-backed implementation of the `LoginHistoryRepository` port.
#[derive(Clone)]
pub struct DieselLoginHistoryRepository {
    pool: DbPool,
}

impl DieselLoginHistoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_fault(fault: StoreFault) -> LoginHistoryRepositoryError {
    match fault {
        StoreFault::Connection(message) => LoginHistoryRepositoryError::connection(message),
        StoreFault::Query(message) | StoreFault::MissingParent(message) => {
            LoginHistoryRepositoryError::query(message)
        }
    }
}

fn row_to_entry(row: LoginHistoryRow) -> LoginHistoryEntry {
    let device_class = match row.device_class.as_str() {
        "mobile" => DeviceClass::Mobile,
        // Desktop is the catch-all, same as classification itself.
        _ => DeviceClass::Desktop,
    };
    LoginHistoryEntry {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        device_class,
        user_agent: row.user_agent,
        platform: row.platform,
        address: row.address,
        created_at: row.created_at,
    }
}

#[async_trait]
impl LoginHistoryRepository for DieselLoginHistoryRepository {
    async fn append(
        &self,
        entry: &LoginHistoryEntry,
    ) -> Result<(), LoginHistoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let row = NewLoginHistoryRow {
            id: entry.id,
            user_id: *entry.user_id.as_uuid(),
            device_class: entry.device_class.code(),
            user_agent: &entry.user_agent,
            platform: entry.platform.as_deref(),
            address: entry.address.as_deref(),
            created_at: entry.created_at,
        };

        diesel::insert_into(login_history::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e: diesel::result::Error| map_fault(e.into()))
    }

    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<LoginHistoryEntry>, LoginHistoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let rows: Vec<LoginHistoryRow> = login_history::table
            .filter(login_history::user_id.eq(user.as_uuid()))
            .order(login_history::created_at.desc())
            .select(LoginHistoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        Ok(rows.into_iter().map(row_to_entry).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    #[case("mobile", DeviceClass::Mobile)]
    #[case("desktop", DeviceClass::Desktop)]
    #[case("toaster", DeviceClass::Desktop)]
    fn stored_codes_round_trip_with_a_catch_all(
        #[case] code: &str,
        #[case] expected: DeviceClass,
    ) {
        let row = LoginHistoryRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            device_class: code.to_owned(),
            user_agent: "agent".to_owned(),
            platform: None,
            address: None,
            created_at: Utc::now(),
        };
        assert_eq!(row_to_entry(row).device_class, expected);
    }
}
