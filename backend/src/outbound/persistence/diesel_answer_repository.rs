//! PostgreSQL-backed `AnswerRepository` implementation using Diesel ORM.
//!
//! The upvote path is a single `UPDATE ... SET upvotes = upvotes + 1
//! RETURNING` statement, so concurrent votes are serialised by the database
//! and none are lost. Both write paths publish a change event on success.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::answer::{Answer, AnswerId};
use crate::domain::ports::{
    AnswerPosted, AnswerRepository, AnswerRepositoryError, ChangeEvent, ChangeOp, Collection,
    UpvoteApplied,
};
use crate::domain::user::UserId;
use crate::outbound::feed::FeedPublisher;

use super::diesel_helpers::StoreFault;
use super::models::NewAnswerRow;
use super::pool::DbPool;
use super::schema::{answers, questions};

/// Diesel-backed implementation of the `AnswerRepository` port.
#[derive(Clone)]
pub struct DieselAnswerRepository {
    pool: DbPool,
    feed: Arc<dyn FeedPublisher>,
}

impl DieselAnswerRepository {
    /// Create a new repository with the given pool and change feed.
    pub fn new(pool: DbPool, feed: Arc<dyn FeedPublisher>) -> Self {
        Self { pool, feed }
    }

    fn publish(&self, op: ChangeOp) {
        self.feed.publish(ChangeEvent {
            collection: Collection::Answers,
            op,
        });
    }
}

fn map_fault(fault: StoreFault) -> AnswerRepositoryError {
    match fault {
        StoreFault::Connection(message) => AnswerRepositoryError::connection(message),
        StoreFault::Query(message) => AnswerRepositoryError::query(message),
        StoreFault::MissingParent(message) => AnswerRepositoryError::missing_question(message),
    }
}

fn upvotes_from_db(upvotes: i32) -> Result<u32, AnswerRepositoryError> {
    u32::try_from(upvotes).map_err(|_| {
        AnswerRepositoryError::query(format!("negative upvote count in database: {upvotes}"))
    })
}

#[async_trait]
impl AnswerRepository for DieselAnswerRepository {
    async fn insert(&self, answer: &Answer) -> Result<AnswerPosted, AnswerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let row = NewAnswerRow {
            id: *answer.id.as_uuid(),
            question_id: *answer.question.as_uuid(),
            author_id: *answer.author.as_uuid(),
            body: &answer.body,
            upvotes: 0,
            created_at: answer.created_at,
        };

        diesel::insert_into(answers::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        let (question_author, question_title): (uuid::Uuid, String) = questions::table
            .filter(questions::id.eq(row.question_id))
            .select((questions::author_id, questions::title))
            .first(&mut conn)
            .await
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        self.publish(ChangeOp::Insert);
        Ok(AnswerPosted {
            question_author: UserId::from_uuid(question_author),
            question_title,
        })
    }

    async fn increment_upvotes(
        &self,
        answer: &AnswerId,
    ) -> Result<Option<UpvoteApplied>, AnswerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let incremented: Option<(i32, uuid::Uuid)> =
            diesel::update(answers::table.filter(answers::id.eq(answer.as_uuid())))
                .set(answers::upvotes.eq(answers::upvotes + 1))
                .returning((answers::upvotes, answers::question_id))
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        let Some((upvotes, question_id)) = incremented else {
            return Ok(None);
        };

        let (question_author, question_title): (uuid::Uuid, String) = questions::table
            .filter(questions::id.eq(question_id))
            .select((questions::author_id, questions::title))
            .first(&mut conn)
            .await
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        self.publish(ChangeOp::Update);
        Ok(Some(UpvoteApplied {
            upvotes: upvotes_from_db(upvotes)?,
            question_author: UserId::from_uuid(question_author),
            question_title,
        }))
    }
}
