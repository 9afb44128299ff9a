//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::language::PreferredLanguage;
use crate::domain::points::Points;
use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::user::{EmailAddress, PhoneNumber, User, UserId};

use super::diesel_helpers::StoreFault;
use super::models::UserRow;
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_fault(fault: StoreFault) -> UserRepositoryError {
    match fault {
        StoreFault::Connection(message) => UserRepositoryError::connection(message),
        StoreFault::Query(message) | StoreFault::MissingParent(message) => {
            UserRepositoryError::query(message)
        }
    }
}

/// Convert a database row to a domain user.
///
/// Corrupted identity columns are surfaced as query errors; an unrecognised
/// language code degrades to the default with a warning, matching how reads
/// should behave when the supported set shrinks.
pub(crate) fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    let email = EmailAddress::new(&row.email).map_err(|err| {
        UserRepositoryError::query(format!("corrupted email in database: {err}"))
    })?;
    let phone = row
        .phone
        .as_deref()
        .map(PhoneNumber::new)
        .transpose()
        .map_err(|err| UserRepositoryError::query(format!("corrupted phone in database: {err}")))?;
    let preferred_language = row
        .preferred_language
        .parse::<PreferredLanguage>()
        .unwrap_or_else(|err| {
            warn!(user_id = %row.id, %err, "unrecognised language code, defaulting");
            PreferredLanguage::default()
        });
    let points = u32::try_from(row.points).map_err(|_| {
        UserRepositoryError::query(format!("negative points balance in database: {}", row.points))
    })?;

    Ok(User::new(
        UserId::from_uuid(row.id),
        email,
        phone,
        preferred_language,
        Points::new(points),
    ))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_fault(e.into()))?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| map_fault(e.into()))?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_fault(e.into()))?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| map_fault(e.into()))?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_fault(e.into()))?;

        let row: Option<UserRow> = users::table
            .filter(users::phone.eq(phone.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| map_fault(e.into()))?;

        row.map(row_to_user).transpose()
    }

    async fn update_language(
        &self,
        id: &UserId,
        language: PreferredLanguage,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_fault(e.into()))?;

        let updated = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set(users::preferred_language.eq(language.code()))
            .execute(&mut conn)
            .await
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        if updated == 0 {
            return Err(UserRepositoryError::query("user not found for update"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    fn row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "ada@example.org".to_owned(),
            phone: Some("+44 20 7946 0958".to_owned()),
            preferred_language: "fr".to_owned(),
            points: 25,
            password_reset_count: 0,
            password_reset_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    fn rows_convert_to_domain_users() {
        let user = row_to_user(row()).expect("valid row");
        assert_eq!(user.email.as_ref(), "ada@example.org");
        assert_eq!(user.preferred_language, PreferredLanguage::Fr);
        assert_eq!(user.points, Points::new(25));
    }

    #[rstest]
    fn unknown_language_codes_degrade_to_the_default() {
        let mut raw = row();
        raw.preferred_language = "tlh".to_owned();
        let user = row_to_user(raw).expect("valid row");
        assert_eq!(user.preferred_language, PreferredLanguage::default());
    }

    #[rstest]
    fn corrupted_email_surfaces_as_a_query_error() {
        let mut raw = row();
        raw.email = "not-an-email".to_owned();
        let err = row_to_user(raw).expect_err("corrupted row");
        assert!(matches!(err, UserRepositoryError::Query { .. }));
    }

    #[rstest]
    fn negative_balances_surface_as_a_query_error() {
        let mut raw = row();
        raw.points = -3;
        let err = row_to_user(raw).expect_err("corrupted row");
        assert!(err.to_string().contains("negative points"));
    }
}
