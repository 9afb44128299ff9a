//! Port for the append-only sign-in audit trail.

use async_trait::async_trait;

use crate::domain::login_history::LoginHistoryEntry;
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by login history adapters.
    pub enum LoginHistoryRepositoryError {
        /// Store connection could not be established. Transient.
        Connection { message: String } => "login history store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "login history store query failed: {message}",
    }
}

/// Port for writing and listing sign-in records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginHistoryRepository: Send + Sync {
    /// Append one record. Entries are never updated or deleted.
    async fn append(&self, entry: &LoginHistoryEntry)
    -> Result<(), LoginHistoryRepositoryError>;

    /// List a user's records, newest first.
    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<LoginHistoryEntry>, LoginHistoryRepositoryError>;
}

/// Fixture implementation that forgets everything.
#[derive(Debug, Default)]
pub struct FixtureLoginHistoryRepository;

#[async_trait]
impl LoginHistoryRepository for FixtureLoginHistoryRepository {
    async fn append(
        &self,
        _entry: &LoginHistoryEntry,
    ) -> Result<(), LoginHistoryRepositoryError> {
        Ok(())
    }

    async fn list_for_user(
        &self,
        _user: &UserId,
    ) -> Result<Vec<LoginHistoryEntry>, LoginHistoryRepositoryError> {
        Ok(Vec::new())
    }
}
