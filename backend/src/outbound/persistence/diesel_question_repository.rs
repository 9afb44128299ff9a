//! PostgreSQL-backed `QuestionRepository` implementation using Diesel ORM.
//!
//! Publishes a change event after each successful insert so the reconciler
//! picks the new question up.

use std::sync::Arc;

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    ChangeEvent, ChangeOp, Collection, QuestionRepository, QuestionRepositoryError,
};
use crate::domain::question::Question;
use crate::outbound::feed::FeedPublisher;

use super::diesel_helpers::StoreFault;
use super::models::NewQuestionRow;
use super::pool::DbPool;
use super::schema::questions;

/// Diesel-backed implementation of the `QuestionRepository` port.
#[derive(Clone)]
pub struct DieselQuestionRepository {
    pool: DbPool,
    feed: Arc<dyn FeedPublisher>,
}

impl DieselQuestionRepository {
    /// Create a new repository with the given pool and change feed.
    pub fn new(pool: DbPool, feed: Arc<dyn FeedPublisher>) -> Self {
        Self { pool, feed }
    }
}

fn map_fault(fault: StoreFault) -> QuestionRepositoryError {
    match fault {
        StoreFault::Connection(message) => QuestionRepositoryError::connection(message),
        StoreFault::Query(message) | StoreFault::MissingParent(message) => {
            QuestionRepositoryError::query(message)
        }
    }
}

#[async_trait]
impl QuestionRepository for DieselQuestionRepository {
    async fn insert(&self, question: &Question) -> Result<(), QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_fault(e.into()))?;

        let row = NewQuestionRow {
            id: *question.id.as_uuid(),
            author_id: *question.author.as_uuid(),
            title: &question.title,
            body: &question.body,
            video_url: question.video.as_ref().map(AsRef::as_ref),
            created_at: question.created_at,
        };

        diesel::insert_into(questions::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|e: diesel::result::Error| map_fault(e.into()))?;

        self.feed.publish(ChangeEvent {
            collection: Collection::Questions,
            op: ChangeOp::Insert,
        });
        Ok(())
    }
}
