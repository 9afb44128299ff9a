//! Port for inserting questions.

use async_trait::async_trait;

use crate::domain::question::Question;

use super::define_port_error;

define_port_error! {
    /// Errors raised by question repository adapters.
    pub enum QuestionRepositoryError {
        /// Store connection could not be established. Transient.
        Connection { message: String } => "question store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "question store query failed: {message}",
    }
}

/// Port for the question side of the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Append a new question.
    async fn insert(&self, question: &Question) -> Result<(), QuestionRepositoryError>;
}

/// Fixture implementation that accepts and discards inserts.
#[derive(Debug, Default)]
pub struct FixtureQuestionRepository;

#[async_trait]
impl QuestionRepository for FixtureQuestionRepository {
    async fn insert(&self, _question: &Question) -> Result<(), QuestionRepositoryError> {
        Ok(())
    }
}
