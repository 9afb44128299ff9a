//! Upvote application via the store's atomic increment.

use std::sync::Arc;

use tracing::info;

use crate::domain::answer::AnswerId;
use crate::domain::ports::{AnswerRepository, Notification, Notifier};

/// Failures of an upvote attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    /// The answer vanished before the increment landed. A no-op failure.
    #[error("answer not found")]
    NotFound,
    /// The store could not apply the increment. Retryable.
    #[error("vote store unavailable: {message}")]
    StoreUnavailable {
        /// Adapter-provided context.
        message: String,
    },
}

/// Applies upvotes and notifies the question author.
///
/// The increment is a single server-side operation, so concurrent upvotes on
/// one answer are never lost. There is deliberately no per-user dedup:
/// repeated calls always increment (matching the product's current
/// behaviour). The returned count is a best-effort immediate value; the
/// board snapshot catches up through the reconciler's next reload.
pub struct VoteCounter {
    answers: Arc<dyn AnswerRepository>,
    notifier: Arc<dyn Notifier>,
}

impl VoteCounter {
    /// Build a counter over the answer store.
    pub fn new(answers: Arc<dyn AnswerRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { answers, notifier }
    }

    /// Upvote one answer, returning its new count.
    pub async fn upvote(&self, answer: &AnswerId) -> Result<u32, VoteError> {
        let applied = self
            .answers
            .increment_upvotes(answer)
            .await
            .map_err(|err| VoteError::StoreUnavailable {
                message: err.to_string(),
            })?
            .ok_or(VoteError::NotFound)?;

        // Best-effort side channel; failures are swallowed by the notifier.
        self.notifier
            .notify(
                &applied.question_author,
                Notification::new(
                    "Answer Upvoted",
                    format!(
                        "An answer to \"{}\" received an upvote!",
                        applied.question_title
                    ),
                ),
            )
            .await;

        info!(answer = %answer, upvotes = applied.upvotes, "upvote applied");
        Ok(applied.upvotes)
    }
}
