//! Registration email verification
//!
//! POST /api/send-otp    {email, memberName?} -> {success}
//! POST /api/verify-otp  {email, otp}         -> {success}

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::models::VerificationPurpose;
use validator::Validate;

use crate::services::{registration, verification};
use crate::state::AppState;
use crate::util::{normalize_email, now_millis};
use crate::validation::{self, validate_otp};

use super::{ApiJson, ApiResult};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub member_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_otp"))]
    pub otp: String,
}

pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<SendOtpRequest>,
) -> ApiResult<Value> {
    req.email = normalize_email(&req.email);
    validation::check(&req)?;

    let name = req
        .member_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    verification::issue(
        &state,
        &req.email,
        VerificationPurpose::Registration,
        name,
        now_millis(),
    )
    .await?;

    Ok(Json(json!({ "success": true, "message": "Verification code sent" })))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<VerifyOtpRequest>,
) -> ApiResult<Value> {
    req.email = normalize_email(&req.email);
    req.otp = req.otp.trim().to_string();
    validation::check(&req)?;

    registration::confirm_email(&state, &req.email, &req.otp, now_millis()).await?;

    Ok(Json(json!({ "success": true, "message": "Email verified" })))
}

#[cfg(test)]
mod tests {
    use crate::api::create_router;
    use crate::api::test_support::{post_json, send};
    use crate::testing::test_env;
    use http::StatusCode;
    use serde_json::json;
    use shared::error::ErrorCode;

    #[tokio::test]
    async fn send_then_verify() {
        let env = test_env();
        let app = create_router(env.state.clone());

        let (status, body) = send(
            &app,
            post_json("/api/send-otp", json!({"email": "a@example.com", "memberName": "Asha"}), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let code = env.mailer.last_code_for("a@example.com").unwrap();
        let (status, body) = send(
            &app,
            post_json("/api/verify-otp", json!({"email": "a@example.com", "otp": code}), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        // Consumed: a replay fails
        let (status, body) = send(
            &app,
            post_json("/api/verify-otp", json!({"email": "a@example.com", "otp": code}), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], u16::from(ErrorCode::VerificationCodeNotFound));
    }

    #[tokio::test]
    async fn resend_invalidates_first_code() {
        let env = test_env();
        let app = create_router(env.state.clone());
        let req = || post_json("/api/send-otp", json!({"email": "a@example.com"}), None);

        send(&app, req()).await;
        let first = env.mailer.last_code_for("a@example.com").unwrap();
        send(&app, req()).await;
        let second = env.mailer.last_code_for("a@example.com").unwrap();

        if first != second {
            let (status, _) = send(
                &app,
                post_json("/api/verify-otp", json!({"email": "a@example.com", "otp": first}), None),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        let (status, _) = send(
            &app,
            post_json("/api/verify-otp", json!({"email": "a@example.com", "otp": second}), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_body_uses_error_shape() {
        let env = test_env();
        let app = create_router(env.state.clone());
        let (status, body) = send(&app, post_json("/api/verify-otp", json!({"email": 5}), None)).await;
        assert!(status.is_client_error());
        assert!(body["error"].is_string());
    }
}
