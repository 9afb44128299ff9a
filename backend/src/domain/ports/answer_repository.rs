//! Port for inserting answers and applying upvote increments.

use async_trait::async_trait;

use crate::domain::answer::{Answer, AnswerId};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by answer repository adapters.
    pub enum AnswerRepositoryError {
        /// Store connection could not be established. Transient.
        Connection { message: String } => "answer store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "answer store query failed: {message}",
        /// The referenced question vanished before the insert landed.
        MissingQuestion { message: String } => "question no longer exists: {message}",
    }
}

/// Context returned after an answer insert, used to notify the question
/// author out-of-band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerPosted {
    /// Author of the answered question.
    pub question_author: UserId,
    /// Title of the answered question.
    pub question_title: String,
}

/// Result of an applied upvote increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpvoteApplied {
    /// The answer's new count, as returned by the store's increment.
    pub upvotes: u32,
    /// Author of the question the answer belongs to.
    pub question_author: UserId,
    /// Title of that question.
    pub question_title: String,
}

/// Port for the answer side of the store.
///
/// `increment_upvotes` MUST be a single server-side increment, never a
/// read-modify-write round trip, so concurrent upvotes are never lost.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Append a new answer and return its question's notification context.
    async fn insert(&self, answer: &Answer) -> Result<AnswerPosted, AnswerRepositoryError>;

    /// Atomically increment an answer's upvote count.
    ///
    /// Returns `None` when the answer does not exist (deleted in a race).
    async fn increment_upvotes(
        &self,
        answer: &AnswerId,
    ) -> Result<Option<UpvoteApplied>, AnswerRepositoryError>;
}

/// Fixture implementation for tests that do not exercise answers.
#[derive(Debug, Default)]
pub struct FixtureAnswerRepository;

#[async_trait]
impl AnswerRepository for FixtureAnswerRepository {
    async fn insert(&self, _answer: &Answer) -> Result<AnswerPosted, AnswerRepositoryError> {
        Ok(AnswerPosted {
            question_author: UserId::random(),
            question_title: "fixture question".to_owned(),
        })
    }

    async fn increment_upvotes(
        &self,
        _answer: &AnswerId,
    ) -> Result<Option<UpvoteApplied>, AnswerRepositoryError> {
        Ok(None)
    }
}
