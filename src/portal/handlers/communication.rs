// Invoice submission handler

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use reqwest::Method;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::portal::middleware::SessionContext;
use crate::portal::server::AppState;

const DOCUMENTS_ECF_PATH: &str = "/TesteCF/documentos-ecf";

/// Submit an e-CF document batch.
///
/// After a certificate upload the gateway attaches the customer's secret id
/// to freshly minted tokens only, so the access token is refreshed before
/// every submission instead of waiting for expiry.
pub async fn submit(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let api_key = headers
        .get("x-api-key")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Validation("Missing x-api-key header".to_string()))?;

    let refreshed = state.sessions.force_refresh(&ctx.session).await?;
    let id_token = refreshed.id_token.as_deref().ok_or(AppError::Unauthorized)?;

    let result = state
        .upstream
        .forward(
            Method::POST,
            DOCUMENTS_ECF_PATH,
            None,
            Some(id_token),
            Some(api_key),
            Some(&body),
        )
        .await?;

    Ok(Json(result))
}
