// Account verification and password recovery handlers

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::portal::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Credential exchange. Returns the signed session token plus the profile
/// projection the dashboard renders.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let (token, session) = state.sessions.login(&body.email, &body.password).await?;

    Ok(Json(json!({
        "token": token,
        "user": session.user,
    })))
}

/// Validate an account verification code. Single use: a second submission
/// of the same code is rejected.
pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<CodeRequest>,
) -> AppResult<Json<Value>> {
    state.verification_codes.verify(&body.email, &body.code)?;

    Ok(Json(json!({ "success": true })))
}

/// Issue (or re-issue) an account verification code and email it.
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> AppResult<Json<Value>> {
    let code = state.verification_codes.issue(&body.email);

    state
        .mailer
        .send(
            &body.email,
            "Verification code",
            &format!("Your verification code is {}", code),
        )
        .await?;

    Ok(Json(
        json!({ "message": "Verification code resent successfully" }),
    ))
}

/// Start password recovery: issue a reset code and email it.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> AppResult<Json<Value>> {
    let code = state.reset_codes.issue(&body.email);

    state
        .mailer
        .send(
            &body.email,
            "Password recovery",
            &format!("Your verification code is {}", code),
        )
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// Finish password recovery: validate the reset code (single use), then
/// instruct the identity provider to set the new password.
pub async fn confirm_forgot_password(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequest>,
) -> AppResult<Json<Value>> {
    state.reset_codes.verify(&body.email, &body.code)?;

    state
        .provider
        .reset_password(&body.email, &body.new_password)
        .await?;

    Ok(Json(json!({ "success": true })))
}
