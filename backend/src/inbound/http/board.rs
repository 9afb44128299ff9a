//! Board read endpoint serving the reconciler's current snapshot.

use actix_web::{HttpResponse, get, web};

use crate::inbound::http::error::ApiResult;
use crate::inbound::http::state::HttpState;

/// Fetch the current board snapshot.
///
/// Serves whatever the reconciler last materialised; the response is always
/// a complete, internally consistent view, never a partially loaded one.
#[utoipa::path(
    get,
    path = "/api/v1/board",
    responses(
        (status = 200, description = "Current board snapshot: question threads newest first")
    ),
    tags = ["board"],
    operation_id = "getBoard",
    security([])
)]
#[get("/board")]
pub async fn get_board(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let snapshot = state.board.borrow().clone();
    Ok(HttpResponse::Ok().json(snapshot.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardSnapshot, BoardSource, QuestionWithAuthor};
    use crate::domain::question::Question;
    use crate::domain::user::{EmailAddress, UserId};
    use crate::inbound::http::test_utils::fixture_http_state;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::Arc;

    #[actix_web::test]
    async fn serves_the_current_snapshot_without_authentication() {
        let (state, snapshots) = fixture_http_state();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(get_board),
        )
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/board").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body.get("questions").and_then(Value::as_array).map(Vec::len),
            Some(0)
        );

        // A reconciler swap is immediately visible to the next read.
        let question = Question::compose(UserId::random(), "Why?", "Because.", None, Utc::now())
            .expect("valid question");
        snapshots.send_replace(Arc::new(BoardSnapshot::assemble(
            BoardSource {
                questions: vec![QuestionWithAuthor {
                    question,
                    author_email: EmailAddress::new("asker@example.org").expect("valid email"),
                }],
                answers: Vec::new(),
            },
            Utc::now(),
        )));

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/board").to_request(),
        )
        .await;
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body.get("questions").and_then(Value::as_array).map(Vec::len),
            Some(1)
        );
    }
}
