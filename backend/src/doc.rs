//! OpenAPI document assembled from the HTTP adapter's annotated handlers.

use utoipa::OpenApi;

use crate::domain::ContactMethod;
use crate::domain::error::ErrorCode;
use crate::inbound::http::answers::{AnswerResponse, SubmitAnswerRequest, UpvoteResponse};
use crate::inbound::http::auth::{LoginRequest, PasswordResetRequest, PasswordResetResponse};
use crate::inbound::http::error::ApiError;
use crate::inbound::http::profile::{
    LoginHistoryResponse, ProfileResponse, TransferRequest, TransferResponse,
    UpdateLanguageRequest,
};
use crate::inbound::http::questions::{
    QuestionResponse, SubmitQuestionRequest, VerifyCodeRequest, VideoUploadRequest,
};

/// Public OpenAPI surface used by Swagger UI and tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Q&A board backend",
        description = "Questions, answers, upvotes, and the engagement policy core."
    ),
    paths(
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::request_password_reset,
        crate::inbound::http::board::get_board,
        crate::inbound::http::questions::submit_question,
        crate::inbound::http::questions::issue_verification_code,
        crate::inbound::http::questions::verify_code,
        crate::inbound::http::answers::submit_answer,
        crate::inbound::http::answers::upvote_answer,
        crate::inbound::http::profile::get_profile,
        crate::inbound::http::profile::update_language,
        crate::inbound::http::profile::transfer_points,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        ContactMethod,
        LoginRequest,
        PasswordResetRequest,
        PasswordResetResponse,
        SubmitQuestionRequest,
        VideoUploadRequest,
        QuestionResponse,
        VerifyCodeRequest,
        SubmitAnswerRequest,
        AnswerResponse,
        UpvoteResponse,
        ProfileResponse,
        LoginHistoryResponse,
        UpdateLanguageRequest,
        TransferRequest,
        TransferResponse,
    )),
    tags(
        (name = "health", description = "Probes"),
        (name = "auth", description = "Sign-in and password resets"),
        (name = "board", description = "Board snapshot reads"),
        (name = "questions", description = "Question submission and verification"),
        (name = "answers", description = "Answers and upvotes"),
        (name = "profile", description = "Profile, language, and points"),
    )
)]
pub struct ApiDoc;
