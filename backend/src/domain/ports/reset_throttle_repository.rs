//! Port for the password-reset throttle state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by reset throttle adapters.
    ///
    /// A failed load MUST surface here and block the reset; it is never an
    /// implicit allow.
    pub enum ResetThrottleRepositoryError {
        /// Store connection could not be established. Transient.
        Connection { message: String } => "reset throttle store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "reset throttle store query failed: {message}",
        /// The subject does not exist in the store.
        UnknownSubject { message: String } => "unknown throttle subject: {message}",
    }
}

/// Persisted counter and stamp for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetThrottleState {
    /// Resets consumed in the current period.
    pub count: u32,
    /// Start of the current period, if any reset ever happened.
    pub last_reset: Option<DateTime<Utc>>,
}

/// Port for reading and writing a subject's reset throttle state.
///
/// The rate limiter serialises access per subject, so adapters only need
/// each individual load/store to be atomic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResetThrottleRepository: Send + Sync {
    /// Load the subject's current state.
    async fn load(&self, subject: &UserId)
    -> Result<ResetThrottleState, ResetThrottleRepositoryError>;

    /// Persist the subject's new state.
    async fn store(
        &self,
        subject: &UserId,
        state: ResetThrottleState,
    ) -> Result<(), ResetThrottleRepositoryError>;
}

/// Fixture implementation with no memory: every subject looks fresh.
#[derive(Debug, Default)]
pub struct FixtureResetThrottleRepository;

#[async_trait]
impl ResetThrottleRepository for FixtureResetThrottleRepository {
    async fn load(
        &self,
        _subject: &UserId,
    ) -> Result<ResetThrottleState, ResetThrottleRepositoryError> {
        Ok(ResetThrottleState::default())
    }

    async fn store(
        &self,
        _subject: &UserId,
        _state: ResetThrottleState,
    ) -> Result<(), ResetThrottleRepositoryError> {
        Ok(())
    }
}
