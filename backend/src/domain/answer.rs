//! Answers and their upvote counts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::question::QuestionId;
use crate::domain::user::UserId;

/// Stable answer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerId(Uuid);

impl AnswerId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for answer content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerValidationError {
    /// Body empty once trimmed.
    #[error("answer body must not be empty")]
    EmptyBody,
}

/// An answer to a question.
///
/// The upvote count is mutated only through the store's atomic increment;
/// this struct is a read-model snapshot of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Stable identifier.
    pub id: AnswerId,
    /// The question this answers. Many answers may reference one question.
    pub question: QuestionId,
    /// Posting user.
    pub author: UserId,
    /// Answer text.
    pub body: String,
    /// Upvotes received so far. Never negative.
    pub upvotes: u32,
    /// Creation instant; answers list oldest first within a question.
    pub created_at: DateTime<Utc>,
}

impl Answer {
    /// Validate content and build a new answer with zero upvotes.
    pub fn compose(
        question: QuestionId,
        author: UserId,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AnswerValidationError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(AnswerValidationError::EmptyBody);
        }
        Ok(Self {
            id: AnswerId::random(),
            question,
            author,
            body,
            upvotes: 0,
            created_at,
        })
    }
}
