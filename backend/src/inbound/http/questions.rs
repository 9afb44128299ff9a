//! Question submission and the video verification challenge endpoints.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{OneTimeCode, Question, VideoAttachment, VideoUpload};
use crate::inbound::http::error::{ApiError, ApiResult};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Declared video metadata in a submission request.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoUploadRequest {
    /// Client-side file name.
    pub file_name: String,
    /// Payload size in bytes.
    pub byte_size: u64,
    /// Duration in whole seconds.
    pub duration_seconds: u32,
}

impl From<VideoUploadRequest> for VideoUpload {
    fn from(value: VideoUploadRequest) -> Self {
        Self {
            file_name: value.file_name,
            byte_size: value.byte_size,
            duration_seconds: value.duration_seconds,
        }
    }
}

/// Question submission body for `POST /api/v1/questions`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuestionRequest {
    /// Short summary line.
    pub title: String,
    /// Full question text.
    pub content: String,
    /// Optional video attachment metadata.
    #[serde(default)]
    pub video: Option<VideoUploadRequest>,
}

/// Posted question summary.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    /// Question identifier.
    pub id: String,
    /// Short summary line.
    pub title: String,
    /// Stored video path, when one was attached.
    pub video_url: Option<String>,
}

/// Post a question.
///
/// Attaching a video requires the upload window to be open and a completed
/// verification challenge; the pending challenge is consumed (and
/// discarded) by this call whether or not the submission succeeds.
#[utoipa::path(
    post,
    path = "/api/v1/questions",
    request_body = SubmitQuestionRequest,
    responses(
        (status = 201, description = "Question posted", body = QuestionResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Login required", body = ApiError),
        (status = 403, description = "Outside the upload window or verification missing", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError)
    ),
    tags = ["questions"],
    operation_id = "submitQuestion"
)]
#[post("/questions")]
pub async fn submit_question(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SubmitQuestionRequest>,
) -> ApiResult<HttpResponse> {
    let author = session.require_user_id()?;
    let body = payload.into_inner();

    let question = Question::compose(author, body.title, body.content, None, state.clock.utc())
        .map_err(|err| ApiError::invalid_request(err.to_string()))?;

    let attachment = body.video.map(|video| VideoAttachment {
        upload: video.into(),
        grant: state.gates.take_grant(&author),
    });

    let posted = state
        .submissions
        .post_question(&author, question, attachment)
        .await?;

    Ok(HttpResponse::Created().json(QuestionResponse {
        id: posted.id.to_string(),
        title: posted.title,
        video_url: posted.video.map(|video| video.as_ref().to_owned()),
    }))
}

/// Issue (or re-issue) a verification code for the video attach flow.
#[utoipa::path(
    post,
    path = "/api/v1/verification/code",
    responses(
        (status = 202, description = "Code issued and handed to the delivery channel"),
        (status = 401, description = "Login required", body = ApiError)
    ),
    tags = ["questions"],
    operation_id = "issueVerificationCode"
)]
#[post("/verification/code")]
pub async fn issue_verification_code(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let code = state
        .gates
        .issue(&user, state.code_generator.as_ref(), state.clock.utc())
        .ok_or_else(|| ApiError::internal("failed to issue verification code"))?;

    state.delivery.deliver_code(&user, &code).await;
    Ok(HttpResponse::Accepted().finish())
}

/// Verification body for `POST /api/v1/verification`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    /// The six-digit code the user received.
    pub code: String,
}

/// Check a verification code against the outstanding challenge.
///
/// A mismatch can be retried while the code is fresh; expiry requires a new
/// code to be issued.
#[utoipa::path(
    post,
    path = "/api/v1/verification",
    request_body = VerifyCodeRequest,
    responses(
        (status = 204, description = "Verified; the next submission may attach a video"),
        (status = 400, description = "Malformed or mismatched code", body = ApiError),
        (status = 401, description = "Login required", body = ApiError),
        (status = 403, description = "No outstanding code, or the code expired", body = ApiError)
    ),
    tags = ["questions"],
    operation_id = "verifyCode"
)]
#[post("/verification")]
pub async fn verify_code(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VerifyCodeRequest>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let candidate = OneTimeCode::new(payload.into_inner().code)
        .ok_or_else(|| ApiError::invalid_request("verification code must be six digits"))?;

    state.gates.verify(&user, &candidate, state.clock.utc())?;
    Ok(HttpResponse::NoContent().finish())
}
