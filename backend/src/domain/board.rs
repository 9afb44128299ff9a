//! The board snapshot: the complete, internally consistent view of
//! questions and answers served to readers at a point in time.
//!
//! Assembly happens here, in pure code, so ordering and referential rules
//! can be tested without a store: questions newest first, answers oldest
//! first within their question, and answers whose question is unknown are
//! dropped rather than surfaced as an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::answer::Answer;
use crate::domain::question::{Question, QuestionId};
use crate::domain::user::EmailAddress;

/// A question joined with its author's display address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionWithAuthor {
    /// The question row.
    #[serde(flatten)]
    pub question: Question,
    /// Author's email, the board's display handle.
    pub author_email: EmailAddress,
}

/// An answer joined with its author's display address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerWithAuthor {
    /// The answer row.
    #[serde(flatten)]
    pub answer: Answer,
    /// Author's email, the board's display handle.
    pub author_email: EmailAddress,
}

/// Raw material for one snapshot, as loaded from the source of truth.
///
/// Row order is not significant; [`BoardSnapshot::assemble`] imposes it.
#[derive(Debug, Clone, Default)]
pub struct BoardSource {
    /// All questions with their authors joined in.
    pub questions: Vec<QuestionWithAuthor>,
    /// All answers with their authors joined in.
    pub answers: Vec<AnswerWithAuthor>,
}

/// One question with its nested, ordered answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionThread {
    /// The question and its author.
    #[serde(flatten)]
    pub question: QuestionWithAuthor,
    /// Answers oldest first.
    pub answers: Vec<AnswerWithAuthor>,
}

/// Complete board view handed to readers.
///
/// Readers always observe a whole snapshot; the reconciler swaps the current
/// one atomically and never exposes a partially loaded view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    /// Question threads newest first.
    pub questions: Vec<QuestionThread>,
    /// When this snapshot was materialised.
    pub loaded_at: DateTime<Utc>,
}

impl BoardSnapshot {
    /// An empty snapshot, used before the first load completes.
    pub const fn empty(loaded_at: DateTime<Utc>) -> Self {
        Self {
            questions: Vec::new(),
            loaded_at,
        }
    }

    /// Derive an ordered snapshot from raw rows.
    ///
    /// Answers referencing a question absent from `source.questions` are
    /// dropped: the question was deleted (or never visible) and the snapshot
    /// must not render dangling references.
    pub fn assemble(source: BoardSource, loaded_at: DateTime<Utc>) -> Self {
        let BoardSource { questions, answers } = source;

        let mut threads: Vec<QuestionThread> = questions
            .into_iter()
            .map(|question| QuestionThread {
                question,
                answers: Vec::new(),
            })
            .collect();
        threads.sort_by(|a, b| b.question.question.created_at.cmp(&a.question.question.created_at));

        let mut sorted_answers = answers;
        sorted_answers.sort_by(|a, b| a.answer.created_at.cmp(&b.answer.created_at));

        for answer in sorted_answers {
            if let Some(thread) = threads
                .iter_mut()
                .find(|thread| thread.question.question.id == answer.answer.question)
            {
                thread.answers.push(answer);
            }
            // else: orphaned answer, dropped.
        }

        Self {
            questions: threads,
            loaded_at,
        }
    }

    /// Find one thread by question id.
    pub fn thread(&self, id: &QuestionId) -> Option<&QuestionThread> {
        self.questions
            .iter()
            .find(|thread| thread.question.question.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::answer::Answer;
    use crate::domain::question::Question;
    use crate::domain::user::UserId;
    use chrono::{Duration, Utc};
    use rstest::rstest;

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::new(raw).expect("valid email")
    }

    fn question(title: &str, created_at: DateTime<Utc>) -> QuestionWithAuthor {
        let question = Question::compose(UserId::random(), title, "body", None, created_at)
            .expect("valid question");
        QuestionWithAuthor {
            question,
            author_email: email("asker@example.org"),
        }
    }

    fn answer(question: QuestionId, created_at: DateTime<Utc>) -> AnswerWithAuthor {
        let answer =
            Answer::compose(question, UserId::random(), "because", created_at).expect("valid");
        AnswerWithAuthor {
            answer,
            author_email: email("helper@example.org"),
        }
    }

    #[rstest]
    fn questions_sort_newest_first_and_answers_oldest_first() {
        let base = Utc::now();
        let older = question("older", base - Duration::hours(2));
        let newer = question("newer", base);
        let older_id = older.question.id;

        let late = answer(older_id, base - Duration::minutes(5));
        let early = answer(older_id, base - Duration::minutes(30));

        let snapshot = BoardSnapshot::assemble(
            BoardSource {
                questions: vec![older.clone(), newer.clone()],
                answers: vec![late.clone(), early.clone()],
            },
            base,
        );

        let titles: Vec<&str> = snapshot
            .questions
            .iter()
            .map(|t| t.question.question.title.as_str())
            .collect();
        assert_eq!(titles, vec!["newer", "older"]);

        let thread = snapshot.thread(&older_id).expect("thread present");
        assert_eq!(thread.answers, vec![early, late]);
    }

    #[rstest]
    fn orphaned_answers_are_dropped_not_errored() {
        let base = Utc::now();
        let kept = question("kept", base);
        let kept_id = kept.question.id;
        let kept_answer = answer(kept_id, base);
        let orphan = answer(QuestionId::random(), base);

        let snapshot = BoardSnapshot::assemble(
            BoardSource {
                questions: vec![kept],
                answers: vec![orphan, kept_answer.clone()],
            },
            base,
        );

        assert_eq!(snapshot.questions.len(), 1);
        let thread = snapshot.thread(&kept_id).expect("thread present");
        assert_eq!(thread.answers, vec![kept_answer]);
    }

    #[rstest]
    fn upstream_delete_converges_to_removed_answer() {
        let base = Utc::now();
        let q = question("q", base);
        let q_id = q.question.id;
        let first = answer(q_id, base - Duration::minutes(2));
        let second = answer(q_id, base - Duration::minutes(1));

        let before = BoardSnapshot::assemble(
            BoardSource {
                questions: vec![q.clone()],
                answers: vec![first.clone(), second.clone()],
            },
            base,
        );
        assert_eq!(before.thread(&q_id).expect("thread").answers.len(), 2);

        // One answer deleted upstream; the next reload simply omits it.
        let after = BoardSnapshot::assemble(
            BoardSource {
                questions: vec![q],
                answers: vec![second.clone()],
            },
            base + Duration::seconds(1),
        );
        let thread = after.thread(&q_id).expect("thread");
        assert_eq!(thread.answers, vec![second]);
        assert_eq!(thread.question, before.thread(&q_id).expect("thread").question);
    }
}
