//! HTTP error envelope and mapping from domain failures.
//!
//! The domain stays transport agnostic; this module translates its typed
//! errors into consistent JSON responses and status codes, attaching the
//! ambient trace identifier. Every mapping preserves the specific reason —
//! callers never see a generic "something went wrong" unless the failure is
//! genuinely internal (which is redacted on purpose).

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::ports::{LoginError, LoginHistoryRepositoryError, UserRepositoryError};
use crate::domain::{
    Error, ErrorCode, ResetRequestError, SubmissionError, TransferError, VerifyError, VoteError,
};
use crate::middleware::trace::{TRACE_ID_HEADER, TraceId};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Standard error envelope returned by HTTP handlers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Stable machine-readable error code.
    #[schema(example = "rate_limited")]
    pub code: ErrorCode,
    /// Human-readable message.
    #[schema(example = "you can only request a password reset once per day")]
    pub message: String,
    /// Correlation identifier for tracing this error across systems.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(alias = "trace_id")]
    pub trace_id: Option<String>,
    /// Supplementary structured details (reason tags, retry hints).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    /// Build an envelope, capturing the ambient trace identifier.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    /// Attach structured details.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    fn to_status_code(&self) -> StatusCode {
        match self.code {
            ErrorCode::InvalidRequest | ErrorCode::VerificationMismatch => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden
            | ErrorCode::PolicyDenied
            | ErrorCode::VerificationRequired
            | ErrorCode::VerificationExpired => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::LedgerRejected => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(value: Error) -> Self {
        let mut mapped = ApiError::new(value.code(), value.message().to_owned());
        mapped.details = value.details().cloned();
        mapped
    }
}

impl From<TransferError> for ApiError {
    fn from(value: TransferError) -> Self {
        match &value {
            TransferError::StoreUnavailable { .. } => {
                ApiError::new(ErrorCode::ServiceUnavailable, value.to_string())
            }
            _ => ApiError::new(ErrorCode::LedgerRejected, value.to_string())
                .with_details(json!({ "reason": value.reason() })),
        }
    }
}

impl From<ResetRequestError> for ApiError {
    fn from(value: ResetRequestError) -> Self {
        match &value {
            ResetRequestError::UserNotFound => {
                ApiError::new(ErrorCode::NotFound, value.to_string())
            }
            ResetRequestError::RateLimited { retry_after } => {
                ApiError::new(ErrorCode::RateLimited, value.to_string())
                    .with_details(json!({ "retryAfterSeconds": retry_after.as_secs() }))
            }
            ResetRequestError::StoreUnavailable { .. } => {
                ApiError::new(ErrorCode::ServiceUnavailable, value.to_string())
            }
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(value: SubmissionError) -> Self {
        let code = match &value {
            SubmissionError::UploadWindowClosed => ErrorCode::PolicyDenied,
            SubmissionError::VerificationRequired => ErrorCode::VerificationRequired,
            SubmissionError::InvalidVideo(_) | SubmissionError::InvalidAnswer(_) => {
                ErrorCode::InvalidRequest
            }
            SubmissionError::QuestionNotFound => ErrorCode::NotFound,
            SubmissionError::StoreUnavailable { .. } => ErrorCode::ServiceUnavailable,
        };
        ApiError::new(code, value.to_string())
    }
}

impl From<VoteError> for ApiError {
    fn from(value: VoteError) -> Self {
        let code = match &value {
            VoteError::NotFound => ErrorCode::NotFound,
            VoteError::StoreUnavailable { .. } => ErrorCode::ServiceUnavailable,
        };
        ApiError::new(code, value.to_string())
    }
}

impl From<VerifyError> for ApiError {
    fn from(value: VerifyError) -> Self {
        let code = match &value {
            VerifyError::Expired => ErrorCode::VerificationExpired,
            VerifyError::Mismatch => ErrorCode::VerificationMismatch,
            VerifyError::NotIssued => ErrorCode::VerificationRequired,
        };
        ApiError::new(code, value.to_string())
    }
}

impl From<LoginError> for ApiError {
    fn from(value: LoginError) -> Self {
        let code = match &value {
            LoginError::InvalidCredentials => ErrorCode::Unauthorized,
            LoginError::Unavailable { .. } => ErrorCode::ServiceUnavailable,
        };
        ApiError::new(code, value.to_string())
    }
}

impl From<UserRepositoryError> for ApiError {
    fn from(value: UserRepositoryError) -> Self {
        match &value {
            UserRepositoryError::Connection { .. } => {
                ApiError::new(ErrorCode::ServiceUnavailable, value.to_string())
            }
            UserRepositoryError::Query { .. } => ApiError::internal(value.to_string()),
        }
    }
}

impl From<LoginHistoryRepositoryError> for ApiError {
    fn from(value: LoginHistoryRepositoryError) -> Self {
        match &value {
            LoginHistoryRepositoryError::Connection { .. } => {
                ApiError::new(ErrorCode::ServiceUnavailable, value.to_string())
            }
            LoginHistoryRepositoryError::Query { .. } => ApiError::internal(value.to_string()),
        }
    }
}

impl From<actix_web::Error> for ApiError {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to API error");
        ApiError::internal("Internal server error")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.to_status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = &self.trace_id {
            builder.insert_header((TRACE_ID_HEADER, id.clone()));
        }
        if matches!(self.code, ErrorCode::InternalError) {
            let mut redacted = self.clone();
            redacted.message = "Internal server error".to_owned();
            redacted.details = None;
            return builder.json(redacted);
        }
        builder.json(self)
    }
}
