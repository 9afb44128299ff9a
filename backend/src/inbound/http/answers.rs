//! Answer submission and upvote handlers.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AnswerId, QuestionId};
use crate::inbound::http::error::{ApiError, ApiResult};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Answer submission body for `POST /api/v1/questions/{id}/answers`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    /// Answer text.
    pub content: String,
}

/// Posted answer summary.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    /// Answer identifier.
    pub id: String,
    /// The answered question.
    pub question_id: String,
    /// Upvotes at creation (always zero).
    pub upvotes: u32,
}

/// Post an answer to a question.
///
/// The question author is notified out-of-band; the board snapshot picks
/// the answer up on the reconciler's next reload.
#[utoipa::path(
    post,
    path = "/api/v1/questions/{id}/answers",
    request_body = SubmitAnswerRequest,
    params(("id" = String, Path, description = "Question identifier")),
    responses(
        (status = 201, description = "Answer posted", body = AnswerResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Login required", body = ApiError),
        (status = 404, description = "Question no longer exists", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError)
    ),
    tags = ["answers"],
    operation_id = "submitAnswer"
)]
#[post("/questions/{id}/answers")]
pub async fn submit_answer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<SubmitAnswerRequest>,
) -> ApiResult<HttpResponse> {
    let author = session.require_user_id()?;
    let question = QuestionId::from_uuid(path.into_inner());

    let answer = state
        .submissions
        .post_answer(&author, &question, payload.into_inner().content)
        .await?;

    Ok(HttpResponse::Created().json(AnswerResponse {
        id: answer.id.to_string(),
        question_id: answer.question.to_string(),
        upvotes: answer.upvotes,
    }))
}

/// Upvote response carrying the best-effort immediate count.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteResponse {
    /// The answer's upvote count right after the increment.
    pub upvotes: u32,
}

/// Upvote an answer.
///
/// Applied as a single atomic increment at the store; repeated votes from
/// one user all count (there is no per-user dedup).
#[utoipa::path(
    post,
    path = "/api/v1/answers/{id}/upvote",
    params(("id" = String, Path, description = "Answer identifier")),
    responses(
        (status = 200, description = "Upvote applied", body = UpvoteResponse),
        (status = 401, description = "Login required", body = ApiError),
        (status = 404, description = "Answer no longer exists", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError)
    ),
    tags = ["answers"],
    operation_id = "upvoteAnswer"
)]
#[post("/answers/{id}/upvote")]
pub async fn upvote_answer(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<UpvoteResponse>> {
    session.require_user_id()?;
    let answer = AnswerId::from_uuid(path.into_inner());

    let upvotes = state.votes.upvote(&answer).await?;
    Ok(web::Json(UpvoteResponse { upvotes }))
}
