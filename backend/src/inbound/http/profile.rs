//! Profile handlers: account summary, language preference, and points
//! transfers.

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{EmailAddress, PreferredLanguage};
use crate::inbound::http::error::{ApiError, ApiResult};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// One sign-in record as shown on the profile.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginHistoryResponse {
    /// Coarse device classification.
    pub device_class: String,
    /// Raw user-agent string.
    pub user_agent: String,
    /// Reported platform, if any.
    pub platform: Option<String>,
    /// Sign-in instant (RFC 3339).
    pub login_time: String,
}

/// Profile summary for the signed-in user.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// Contact email.
    pub email: String,
    /// Optional phone contact.
    pub phone: Option<String>,
    /// Interface language code.
    pub preferred_language: String,
    /// Current points balance.
    pub points: u32,
    /// Sign-in history, newest first.
    pub login_history: Vec<LoginHistoryResponse>,
}

/// Fetch the signed-in user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Profile summary", body = ProfileResponse),
        (status = 401, description = "Login required", body = ApiError),
        (status = 404, description = "Account vanished", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError)
    ),
    tags = ["profile"],
    operation_id = "getProfile"
)]
#[get("/profile")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ProfileResponse>> {
    let user_id = session.require_user_id()?;

    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("account no longer exists"))?;
    let history = state.login_history.list_for_user(&user_id).await?;

    Ok(web::Json(ProfileResponse {
        email: user.email.to_string(),
        phone: user.phone.map(|phone| phone.to_string()),
        preferred_language: user.preferred_language.to_string(),
        points: user.points.value(),
        login_history: history
            .into_iter()
            .map(|entry| LoginHistoryResponse {
                device_class: entry.device_class.to_string(),
                user_agent: entry.user_agent,
                platform: entry.platform,
                login_time: entry.created_at.to_rfc3339(),
            })
            .collect(),
    }))
}

/// Language update body for `PUT /api/v1/profile/language`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLanguageRequest {
    /// Short language code from the supported set.
    pub language: String,
}

/// Update the signed-in user's preferred language.
///
/// The code is validated against the closed supported set; free-form
/// values are rejected with the valid options in the error details.
#[utoipa::path(
    put,
    path = "/api/v1/profile/language",
    request_body = UpdateLanguageRequest,
    responses(
        (status = 204, description = "Language updated"),
        (status = 400, description = "Unsupported language code", body = ApiError),
        (status = 401, description = "Login required", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError)
    ),
    tags = ["profile"],
    operation_id = "updateLanguage"
)]
#[put("/profile/language")]
pub async fn update_language(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateLanguageRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;

    let language = payload
        .into_inner()
        .language
        .parse::<PreferredLanguage>()
        .map_err(|err| {
            ApiError::invalid_request(err.to_string()).with_details(json!({
                "supported": PreferredLanguage::ALL
                    .iter()
                    .map(|l| l.code())
                    .collect::<Vec<_>>(),
            }))
        })?;

    state.users.update_language(&user_id, language).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Transfer body for `POST /api/v1/points/transfers`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Recipient account's email address.
    pub recipient_email: String,
    /// Points to move; must be positive.
    pub amount: u32,
}

/// Transfer receipt.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    /// Audit record identifier.
    pub transfer_id: String,
    /// Points moved.
    pub amount: u32,
    /// Sender's balance after the debit.
    pub sender_balance: u32,
}

/// Transfer points to another user.
///
/// Refusals carry the exact reason (standing minimum, insufficient
/// balance, unknown recipient, self transfer, non-positive amount) so the
/// client can render a precise message.
#[utoipa::path(
    post,
    path = "/api/v1/points/transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer applied", body = TransferResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Login required", body = ApiError),
        (status = 422, description = "Ledger refused the transfer", body = ApiError),
        (status = 503, description = "Store unavailable", body = ApiError)
    ),
    tags = ["profile"],
    operation_id = "transferPoints"
)]
#[post("/points/transfers")]
pub async fn transfer_points(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TransferRequest>,
) -> ApiResult<web::Json<TransferResponse>> {
    let sender = session.require_user_id()?;
    let body = payload.into_inner();

    let recipient = EmailAddress::new(&body.recipient_email)
        .map_err(|err| ApiError::invalid_request(err.to_string()))?;

    let receipt = state.ledger.transfer(&sender, &recipient, body.amount).await?;
    Ok(web::Json(TransferResponse {
        transfer_id: receipt.transfer.id.to_string(),
        amount: receipt.transfer.amount.value(),
        sender_balance: receipt.balances.sender.value(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::points::Points;
    use crate::domain::ports::{
        MockPointsRepository, MockUserRepository, TransferBalances,
    };
    use crate::domain::{PointsLedger, User, UserId};
    use crate::inbound::http::test_utils::{fixture_http_state, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use mockable::DefaultClock;
    use serde_json::Value;
    use std::sync::Arc;

    fn recipient(email: &str) -> User {
        User::new(
            UserId::random(),
            EmailAddress::new(email).expect("valid email"),
            None,
            PreferredLanguage::default(),
            Points::new(0),
        )
    }

    fn app_with_ledger(
        ledger: PointsLedger,
        sender: UserId,
    ) -> (
        actix_web::web::Data<crate::inbound::http::state::HttpState>,
        UserId,
    ) {
        let (mut state, _snapshots) = fixture_http_state();
        state.ledger = Arc::new(ledger);
        (web::Data::new(state), sender)
    }

    fn session_cookie<B>(
        res: &actix_web::dev::ServiceResponse<B>,
    ) -> actix_web::cookie::Cookie<'static> {
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    fn test_login_route() -> actix_web::Route {
        web::get().to(
            |session: crate::inbound::http::session::SessionContext,
             path: web::Path<uuid::Uuid>| async move {
                session
                    .persist_user(&UserId::from_uuid(path.into_inner()))
                    .map(|()| HttpResponse::Ok().finish())
            },
        )
    }

    #[actix_web::test]
    async fn transfer_endpoint_returns_the_receipt() {
        let sender = UserId::random();
        let to = recipient("to@example.org");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(to.clone())));
        let mut points = MockPointsRepository::new();
        points
            .expect_balance_of()
            .returning(|_| Ok(Points::new(25)));
        points.expect_apply_transfer().returning(|_| {
            Ok(TransferBalances {
                sender: Points::new(15),
                recipient: Points::new(10),
            })
        });
        let ledger = PointsLedger::new(Arc::new(users), Arc::new(points), Arc::new(DefaultClock));
        let (state, sender) = app_with_ledger(ledger, sender);

        let app = actix_test::init_service(
            App::new()
                .app_data(state)
                .wrap(test_session_middleware())
                .route("/test-login/{id}", test_login_route())
                .service(transfer_points),
        )
        .await;

        let login_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/test-login/{sender}"))
                .to_request(),
        )
        .await;
        let cookie = session_cookie(&login_res);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/points/transfers")
                .cookie(cookie)
                .set_json(TransferRequest {
                    recipient_email: "to@example.org".to_owned(),
                    amount: 10,
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("amount").and_then(Value::as_u64), Some(10));
        assert_eq!(body.get("senderBalance").and_then(Value::as_u64), Some(15));
    }

    #[actix_web::test]
    async fn transfers_below_standing_minimum_are_unprocessable() {
        let sender = UserId::random();
        let to = recipient("to@example.org");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(to.clone())));
        let mut points = MockPointsRepository::new();
        points.expect_balance_of().returning(|_| Ok(Points::new(9)));
        points.expect_apply_transfer().times(0);
        let ledger = PointsLedger::new(Arc::new(users), Arc::new(points), Arc::new(DefaultClock));
        let (state, sender) = app_with_ledger(ledger, sender);

        let app = actix_test::init_service(
            App::new()
                .app_data(state)
                .wrap(test_session_middleware())
                .route("/test-login/{id}", test_login_route())
                .service(transfer_points),
        )
        .await;

        let login_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/test-login/{sender}"))
                .to_request(),
        )
        .await;
        let cookie = session_cookie(&login_res);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/points/transfers")
                .cookie(cookie)
                .set_json(TransferRequest {
                    recipient_email: "to@example.org".to_owned(),
                    amount: 5,
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body.get("code").and_then(Value::as_str),
            Some("ledger_rejected")
        );
        assert_eq!(
            body.get("details")
                .and_then(|d| d.get("reason"))
                .and_then(Value::as_str),
            Some("insufficient_standing")
        );
    }

    #[actix_web::test]
    async fn transfers_without_a_session_are_unauthorised() {
        let (state, _snapshots) = fixture_http_state();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(test_session_middleware())
                .service(transfer_points),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/points/transfers")
                .set_json(TransferRequest {
                    recipient_email: "to@example.org".to_owned(),
                    amount: 5,
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
