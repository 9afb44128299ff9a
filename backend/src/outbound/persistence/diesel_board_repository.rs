//! PostgreSQL-backed `BoardRepository` implementation using Diesel ORM.
//!
//! Loads the complete board in two joined queries; ordering and orphan
//! handling are the snapshot assembler's job, not SQL's.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::answer::{Answer, AnswerId};
use crate::domain::board::{AnswerWithAuthor, BoardSource, QuestionWithAuthor};
use crate::domain::ports::{BoardRepository, BoardRepositoryError};
use crate::domain::question::{Question, QuestionId, VideoReference};
use crate::domain::user::{EmailAddress, UserId};

use super::diesel_helpers::StoreFault;
use super::models::{AnswerRow, QuestionRow};
use super::pool::DbPool;
use super::schema::{answers, questions, users};

/// Diesel-backed implementation of the `BoardRepository` port.
#[derive(Clone)]
pub struct DieselBoardRepository {
    pool: DbPool,
}

impl DieselBoardRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_fault(fault: StoreFault) -> BoardRepositoryError {
    match fault {
        StoreFault::Connection(message) => BoardRepositoryError::connection(message),
        StoreFault::Query(message) | StoreFault::MissingParent(message) => {
            BoardRepositoryError::query(message)
        }
    }
}

fn author_email(raw: &str) -> Result<EmailAddress, BoardRepositoryError> {
    EmailAddress::new(raw)
        .map_err(|err| BoardRepositoryError::query(format!("corrupted email in database: {err}")))
}

fn question_from_row(
    row: QuestionRow,
    email: &str,
) -> Result<QuestionWithAuthor, BoardRepositoryError> {
    Ok(QuestionWithAuthor {
        question: Question {
            id: QuestionId::from_uuid(row.id),
            author: UserId::from_uuid(row.author_id),
            title: row.title,
            body: row.body,
            video: row.video_url.map(VideoReference::new),
            created_at: row.created_at,
        },
        author_email: author_email(email)?,
    })
}

fn answer_from_row(row: AnswerRow, email: &str) -> Result<AnswerWithAuthor, BoardRepositoryError> {
    let upvotes = u32::try_from(row.upvotes).map_err(|_| {
        BoardRepositoryError::query(format!(
            "negative upvote count in database: {}",
            row.upvotes
        ))
    })?;
    Ok(AnswerWithAuthor {
        answer: Answer {
            id: AnswerId::from_uuid(row.id),
            question: QuestionId::from_uuid(row.question_id),
            author: UserId::from_uuid(row.author_id),
            body: row.body,
            upvotes,
            created_at: row.created_at,
        },
        author_email: author_email(email)?,
    })
}

#[async_trait]
impl BoardRepository for DieselBoardRepository {
    async fn fetch_all(&self) -> Result<BoardSource, BoardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let question_rows: Vec<(QuestionRow, String)> = questions::table
            .inner_join(users::table)
            .select((QuestionRow::as_select(), users::email))
            .load(&mut conn)
            .await
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        let answer_rows: Vec<(AnswerRow, String)> = answers::table
            .inner_join(users::table)
            .select((AnswerRow::as_select(), users::email))
            .load(&mut conn)
            .await
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        let questions = question_rows
            .into_iter()
            .map(|(row, email)| question_from_row(row, &email))
            .collect::<Result<Vec<_>, _>>()?;
        let answers = answer_rows
            .into_iter()
            .map(|(row, email)| answer_from_row(row, &email))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BoardSource { questions, answers })
    }
}
