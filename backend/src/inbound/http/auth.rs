//! Sign-in, sign-out, and password-reset request handlers.

use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{
    ClientInfo, ContactIdentifier, ContactMethod, CredentialsValidationError, DeviceClass,
    LoginCredentials, LoginHistoryEntry, MOBILE_ACCESS_WINDOW,
};
use crate::inbound::http::error::{ApiError, ApiResult};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Whether `identifier` is an email address or a phone number.
    pub method: ContactMethod,
    /// The account's contact identifier.
    pub identifier: String,
    /// The account password.
    pub password: String,
    /// Client-reported platform, recorded in the sign-in audit trail.
    #[serde(default)]
    pub platform: Option<String>,
}

fn map_credentials_error(err: CredentialsValidationError) -> ApiError {
    ApiError::invalid_request(err.to_string())
}

/// Authenticate a user and establish a session.
///
/// Mobile-classified clients are admitted only inside the mobile access
/// window; the check runs before credentials are even considered. Each
/// successful sign-in appends a login-history record.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError),
        (status = 403, description = "Outside the mobile access window", body = ApiError),
        (status = 503, description = "Identity provider unavailable", body = ApiError)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();

    let user_agent = req
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let device_class = DeviceClass::classify(&user_agent);

    if device_class == DeviceClass::Mobile && !MOBILE_ACCESS_WINDOW.allows(&state.clock.local()) {
        return Err(ApiError::new(
            crate::domain::ErrorCode::PolicyDenied,
            format!(
                "mobile access is only available between {}",
                MOBILE_ACCESS_WINDOW.describe()
            ),
        ));
    }

    let identifier = ContactIdentifier::parse(body.method, &body.identifier)
        .map_err(|err| ApiError::invalid_request(err.to_string()))?;
    let credentials = LoginCredentials::try_from_parts(identifier, body.password)
        .map_err(map_credentials_error)?;

    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;

    let entry = LoginHistoryEntry::record(
        user_id,
        ClientInfo {
            user_agent,
            platform: body.platform,
            address: req
                .connection_info()
                .realip_remote_addr()
                .map(ToOwned::to_owned),
        },
        state.clock.utc(),
    );
    // Audit only: a failed append must not fail the sign-in.
    if let Err(err) = state.login_history.append(&entry).await {
        warn!(user = %user_id, %err, "failed to record login history");
    }

    Ok(HttpResponse::Ok().finish())
}

/// Drop the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(state: web::Data<HttpState>, session: SessionContext) -> HttpResponse {
    if let Ok(Some(user)) = session.user_id() {
        // Abandoning the session abandons any pending verification flow.
        state.gates.discard(&user);
    }
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Password-reset request body for `POST /api/v1/password-resets`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    /// Whether `identifier` is an email address or a phone number.
    pub method: ContactMethod,
    /// The account's contact identifier.
    pub identifier: String,
}

/// Password-reset response carrying the generated replacement password.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetResponse {
    /// The replacement password, shown exactly once.
    pub generated_password: String,
}

/// Request a password reset.
///
/// Allowed at most once per rolling day per account. A store fault blocks
/// the request; it is never treated as permission granted.
#[utoipa::path(
    post,
    path = "/api/v1/password-resets",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset granted", body = PasswordResetResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "No matching account", body = ApiError),
        (status = 429, description = "Allowance exhausted for this period", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError)
    ),
    tags = ["auth"],
    operation_id = "requestPasswordReset",
    security([])
)]
#[post("/password-resets")]
pub async fn request_password_reset(
    state: web::Data<HttpState>,
    payload: web::Json<PasswordResetRequest>,
) -> ApiResult<web::Json<PasswordResetResponse>> {
    let body = payload.into_inner();
    let contact = ContactIdentifier::parse(body.method, &body.identifier)
        .map_err(|err| ApiError::invalid_request(err.to_string()))?;

    let password = state.password_reset.request(&contact).await?;
    Ok(web::Json(PasswordResetResponse {
        generated_password: password.reveal().to_owned(),
    }))
}
