// Document listing, download and retry handlers

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::{Extension, Json};
use reqwest::Method;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::Stage;
use crate::portal::middleware::SessionContext;
use crate::portal::server::AppState;

const DOWNLOAD_PATH: &str = "/TesteCF/customer/documents";

/// List documents for a stage; all other query filters are relayed as-is.
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    let id_token = ctx.session.id_token.as_deref().ok_or(AppError::Unauthorized)?;
    let stage = stage_param(&params)?;

    let query = {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &params {
            if key != "environment" {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    };

    let path = format!("/{}/customer/documents", stage);
    let result = state
        .upstream
        .forward(
            Method::GET,
            &path,
            (!query.is_empty()).then_some(query.as_str()),
            Some(id_token),
            None,
            None,
        )
        .await?;

    Ok(Json(result))
}

/// Fetch a signed document file by name.
pub async fn download(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    let id_token = ctx.session.id_token.as_deref().ok_or(AppError::Unauthorized)?;

    if !params.contains_key("file") {
        return Err(AppError::Validation("Missing file parameter".to_string()));
    }

    let query = {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &params {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    };

    let result = state
        .upstream
        .forward(
            Method::GET,
            DOWNLOAD_PATH,
            Some(&query),
            Some(id_token),
            None,
            None,
        )
        .await?;

    Ok(Json(result))
}

/// Ask the gateway to re-submit a previously failed e-CF document.
pub async fn retry(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let id_token = ctx.session.id_token.as_deref().ok_or(AppError::Unauthorized)?;
    let stage = stage_param(&params)?;

    let ecf = body
        .get("ecf")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Validation("Missing ecf".to_string()))?;
    if ecf.is_empty() || !ecf.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation("Invalid ecf".to_string()));
    }

    let path = format!("/{}/customer/retry-ecf/{}", stage, ecf);

    // The gateway expects an empty body on retries
    let result = state
        .upstream
        .forward(
            Method::POST,
            &path,
            None,
            Some(id_token),
            None,
            Some(&json!({})),
        )
        .await?;

    Ok(Json(result))
}

fn stage_param(params: &HashMap<String, String>) -> AppResult<Stage> {
    params
        .get("environment")
        .ok_or_else(|| AppError::Validation("Missing environment parameter".to_string()))?
        .parse()
}
