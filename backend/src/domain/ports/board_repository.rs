//! Port for the full board load the reconciler relies on.

use async_trait::async_trait;

use crate::domain::board::BoardSource;

use super::define_port_error;

define_port_error! {
    /// Errors raised by board repository adapters.
    pub enum BoardRepositoryError {
        /// Store connection could not be established. Transient.
        Connection { message: String } => "board store connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "board store query failed: {message}",
    }
}

/// Port loading the complete board from the source of truth.
///
/// The reconciler always re-derives the whole view rather than trusting
/// change-event payloads, so this is its only read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Load every question and answer with author display fields joined in.
    async fn fetch_all(&self) -> Result<BoardSource, BoardRepositoryError>;
}

/// Fixture implementation serving an empty board.
#[derive(Debug, Default)]
pub struct FixtureBoardRepository;

#[async_trait]
impl BoardRepository for FixtureBoardRepository {
    async fn fetch_all(&self) -> Result<BoardSource, BoardRepositoryError> {
        Ok(BoardSource::default())
    }
}
