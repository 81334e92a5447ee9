// Registration handler

use axum::extract::State;
use axum::Json;
use reqwest::Method;
use serde_json::Value;

use crate::error::AppResult;
use crate::portal::server::AppState;

const SIGNUP_PATH: &str = "/TesteCF/customer/signup";

/// Forward a registration request to the gateway. Runs before the account
/// exists, so it is the one unauthenticated forward.
pub async fn add_user(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let result = state
        .upstream
        .forward(Method::POST, SIGNUP_PATH, None, None, None, Some(&body))
        .await?;

    Ok(Json(result))
}
