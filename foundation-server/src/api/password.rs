//! Password reset by email code
//!
//! POST /api/send-password-reset-otp   {email}                  -> {success}
//! POST /api/verify-password-reset-otp {email, otp}             -> {token}
//! POST /api/reset-password            {email, password, token} -> {success}

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use crate::services::accounts;
use crate::state::AppState;
use crate::util::{normalize_email, now_millis};
use crate::validation::{self, validate_otp};

use super::{ApiJson, ApiResult};

#[derive(Debug, Deserialize, Validate)]
pub struct ResetOtpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyResetOtpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_otp"))]
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
}

/// Always succeeds for well-formed emails, registered or not
pub async fn send_password_reset_otp(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<ResetOtpRequest>,
) -> ApiResult<Value> {
    req.email = normalize_email(&req.email);
    validation::check(&req)?;

    accounts::send_reset_code(&state, &req.email, now_millis()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "If the email is registered, a reset code has been sent"
    })))
}

pub async fn verify_password_reset_otp(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<VerifyResetOtpRequest>,
) -> ApiResult<ResetTokenResponse> {
    req.email = normalize_email(&req.email);
    req.otp = req.otp.trim().to_string();
    validation::check(&req)?;

    let token = accounts::verify_reset_code(&state, &req.email, &req.otp, now_millis()).await?;
    Ok(Json(ResetTokenResponse { token }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Value> {
    req.email = normalize_email(&req.email);
    validation::check(&req)?;

    accounts::reset_password(&state, &req.email, &req.password, &req.token, now_millis()).await?;

    Ok(Json(json!({ "success": true, "message": "Password updated" })))
}
