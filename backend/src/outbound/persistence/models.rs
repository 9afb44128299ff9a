//! Diesel row structs: internal to the persistence layer, never exposed to
//! the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{answers, login_history, points_transfers, questions, users};

/// Read model for one `users` row.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub preferred_language: String,
    pub points: i32,
    pub password_reset_count: i32,
    pub password_reset_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read model for one `questions` row.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = questions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuestionRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert model for `questions`.
#[derive(Debug, Insertable)]
#[diesel(table_name = questions)]
pub struct NewQuestionRow<'a> {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: &'a str,
    pub body: &'a str,
    pub video_url: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Read model for one `answers` row.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = answers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AnswerRow {
    pub id: Uuid,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub upvotes: i32,
    pub created_at: DateTime<Utc>,
}

/// Insert model for `answers`.
#[derive(Debug, Insertable)]
#[diesel(table_name = answers)]
pub struct NewAnswerRow<'a> {
    pub id: Uuid,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub body: &'a str,
    pub upvotes: i32,
    pub created_at: DateTime<Utc>,
}

/// Insert model for `points_transfers`.
#[derive(Debug, Insertable)]
#[diesel(table_name = points_transfers)]
pub struct NewPointsTransferRow {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
}

/// Read model for one `login_history` row.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = login_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LoginHistoryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_class: String,
    pub user_agent: String,
    pub platform: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert model for `login_history`.
#[derive(Debug, Insertable)]
#[diesel(table_name = login_history)]
pub struct NewLoginHistoryRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_class: &'a str,
    pub user_agent: &'a str,
    pub platform: Option<&'a str>,
    pub address: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}
