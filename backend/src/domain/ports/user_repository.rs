//! Port for user account lookups and profile updates.

use async_trait::async_trait;

use crate::domain::language::PreferredLanguage;
use crate::domain::user::{EmailAddress, PhoneNumber, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Store connection could not be established. Transient.
        Connection { message: String } => "user store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user store query failed: {message}",
    }
}

/// Port for reading and updating user accounts.
///
/// Identity fields are owned by the external identity provider; the core
/// only reads them and updates the profile attributes it governs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by email address.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user by phone number.
    async fn find_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Persist a new preferred language for the user.
    async fn update_language(
        &self,
        id: &UserId,
        language: PreferredLanguage,
    ) -> Result<(), UserRepositoryError>;
}

/// Fixture implementation for tests that do not exercise user lookups.
///
/// Every lookup misses and updates are discarded.
#[derive(Debug, Default)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(&self, _id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_by_email(
        &self,
        _email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_by_phone(
        &self,
        _phone: &PhoneNumber,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn update_language(
        &self,
        _id: &UserId,
        _language: PreferredLanguage,
    ) -> Result<(), UserRepositoryError> {
        Ok(())
    }
}
