//! WebSocket inbound adapter streaming board snapshots and notifications.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list)
//! - resolve the session user so notifications can be scoped
//! - spawn the per-connection handler and keep WebSocket concerns at the
//!   edge of the system

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
    rt,
};
use tracing::{error, warn};
use url::Url;

use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

/// Handle WebSocket upgrade for the `/ws` endpoint (mounted under the
/// `/ws` scope by the server).
#[get("")]
pub async fn ws_entry(
    ws_state: web::Data<state::WsState>,
    session_context: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(origin_header)?;

    // Anonymous connections still stream the board; they just get no
    // notifications.
    let user = session_context.user_id().unwrap_or_default();

    let (response, ws_session, message_stream) =
        actix_ws::handle(&req, stream).map_err(|err| {
            error!(error = %err, "WebSocket upgrade failed");
            actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
        })?;

    rt::spawn(session::handle_ws_session(
        ws_state.get_ref().clone(),
        user,
        ws_session,
        message_stream,
    ));
    Ok(response)
}

fn validate_origin(origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(err) => {
            error!(error = %err, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|err| {
        error!(error = %err, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if is_allowed_origin(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

const PRIMARY_HOST: &str = "board.example";
const LOCALHOST: &str = "localhost";
const ALLOWED_SUBDOMAIN_SUFFIX: &str = ".board.example";

/// Returns true when a parsed Origin belongs to the static allow-list.
///
/// HTTPS from the production root domain and its subdomains, plus HTTP from
/// localhost with a non-zero explicit port for development. Should move to
/// runtime configuration once one exists for the WS surface.
fn is_allowed_origin(origin: &Url) -> bool {
    let host = match origin.host_str() {
        Some(value) => value,
        None => return false,
    };

    match origin.scheme() {
        "http" if host == LOCALHOST => matches!(origin.port(), Some(port) if port != 0),
        "https" if host == PRIMARY_HOST => true,
        "https" if host.strip_suffix(ALLOWED_SUBDOMAIN_SUFFIX).is_some() => true,
        _ => false,
    }
}
