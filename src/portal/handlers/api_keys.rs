// API key management handlers

use axum::extract::State;
use axum::{Extension, Json};
use reqwest::Method;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::ApiKeyInput;
use crate::portal::middleware::SessionContext;
use crate::portal::server::AppState;

const LIST_PATH: &str = "/TesteCF/customer/apikeys";
const KEY_PATH: &str = "/TesteCF/customer/apikey";

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> AppResult<Json<Value>> {
    let id_token = ctx.session.id_token.as_deref().ok_or(AppError::Unauthorized)?;

    let result = state
        .upstream
        .forward(Method::GET, LIST_PATH, None, Some(id_token), None, None)
        .await?;

    Ok(Json(result))
}

/// Create a key in the stage the caller picked.
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(input): Json<ApiKeyInput>,
) -> AppResult<Json<Value>> {
    let id_token = ctx.session.id_token.as_deref().ok_or(AppError::Unauthorized)?;

    let path = format!("/{}/customer/apikey", input.stage);
    let body = json!({
        "action": "create",
        "description": input.description,
    });

    let result = state
        .upstream
        .forward(Method::POST, &path, None, Some(id_token), None, Some(&body))
        .await?;

    Ok(Json(result))
}

/// Delete a key; the gateway expects the action envelope in the body.
pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let id_token = ctx.session.id_token.as_deref().ok_or(AppError::Unauthorized)?;

    let result = state
        .upstream
        .forward(
            Method::DELETE,
            KEY_PATH,
            None,
            Some(id_token),
            None,
            Some(&body),
        )
        .await?;

    Ok(Json(result))
}
