// Digital certificate handlers

use axum::extract::{Query, State};
use axum::{Extension, Json};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::portal::middleware::SessionContext;
use crate::portal::server::AppState;

const CERTIFICATE_PATH: &str = "/TesteCF/customer/certificate";

#[derive(Debug, Deserialize)]
pub struct CertificateQuery {
    pub file: Option<String>,
}

/// Upload a certificate; the payload is relayed verbatim.
pub async fn upload(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let id_token = ctx.session.id_token.as_deref().ok_or(AppError::Unauthorized)?;

    let result = state
        .upstream
        .forward(
            Method::POST,
            CERTIFICATE_PATH,
            None,
            Some(id_token),
            None,
            Some(&body),
        )
        .await?;

    Ok(Json(result))
}

/// Fetch certificate metadata, or a single file when `file` is given.
pub async fn fetch(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<CertificateQuery>,
) -> AppResult<Json<Value>> {
    let id_token = ctx.session.id_token.as_deref().ok_or(AppError::Unauthorized)?;

    let query_string = query.file.as_deref().map(|file| {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("file", file)
            .finish()
    });

    let result = state
        .upstream
        .forward(
            Method::GET,
            CERTIFICATE_PATH,
            query_string.as_deref(),
            Some(id_token),
            None,
            None,
        )
        .await?;

    Ok(Json(result))
}
