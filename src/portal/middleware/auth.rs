// Session authentication middleware

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::portal::server::AppState;
use crate::portal::session::Session;

/// Response header carrying a rotated session token after a refresh.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Session resolved for the current request, available to handlers
/// through request extensions.
#[derive(Clone)]
pub struct SessionContext {
    pub session: Session,
}

/// Gate a route on a valid session. The caller presents the session token
/// as a bearer credential; an absent, invalid, or errored session answers
/// 401 before anything is forwarded upstream.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_owned);

    let Some(token) = token else {
        return unauthorized();
    };

    let outcome = match state.sessions.read(&token).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!("Session read failed: {}", err);
            return unauthorized();
        }
    };

    if outcome.session.error.is_some() || outcome.session.id_token.is_none() {
        return unauthorized();
    }

    let reissued = outcome.reissued;
    request.extensions_mut().insert(SessionContext {
        session: outcome.session,
    });

    let mut response = next.run(request).await;

    // Hand a rotated token back so the client keeps the fresh credentials
    if let Some(token) = reissued {
        if let Ok(value) = HeaderValue::from_str(&token) {
            response.headers_mut().insert(SESSION_TOKEN_HEADER, value);
        }
    }

    response
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}
