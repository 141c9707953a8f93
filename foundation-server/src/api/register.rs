//! POST /api/member-register (multipart form)
//!
//! Fields: memberName, address, mobile, email, password, referredBy (optional),
//! photo (optional file). Creates a pending account; the client then calls
//! `/api/send-otp` and `/api/verify-otp`.

use axum::Json;
use axum::extract::{Multipart, State};
use http::StatusCode;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::MemberView;
use validator::Validate;

use crate::services::registration::{self, Registration};
use crate::state::AppState;
use crate::uploads::PhotoUpload;
use crate::util::{normalize_email, now_millis};
use crate::validation::{self, validate_mobile};

#[derive(Debug, Default, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub member_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
    pub address: Option<String>,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub referred_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub member: MemberView,
    pub message: String,
}

fn multipart_error(e: impl std::fmt::Display) -> AppError {
    AppError::with_message(ErrorCode::InvalidRequest, format!("Multipart error: {e}"))
}

/// Read the form, keeping at most one photo
async fn read_form(mut multipart: Multipart) -> Result<(RegisterForm, Option<PhotoUpload>), AppError> {
    let mut form = RegisterForm::default();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?.to_vec();
            // Browsers send an empty part when no file was chosen
            if !data.is_empty() || file_name.as_deref().is_some_and(|f| !f.is_empty()) {
                photo = Some(PhotoUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "memberName" => form.member_name = value.trim().to_string(),
            "email" => form.email = normalize_email(&value),
            "mobile" => form.mobile = value.trim().to_string(),
            "address" => form.address = Some(value.trim().to_string()).filter(|v| !v.is_empty()),
            "password" => form.password = value,
            "referredBy" => form.referred_by = Some(value.trim().to_string()).filter(|v| !v.is_empty()),
            _ => tracing::debug!(field = %name, "Ignoring unknown form field"),
        }
    }

    Ok((form, photo))
}

pub async fn member_register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let (form, photo) = read_form(multipart).await?;
    validation::check(&form)?;

    let member = registration::register(
        &state,
        Registration {
            name: form.member_name,
            email: form.email,
            mobile: form.mobile,
            address: form.address,
            password: form.password,
            referred_by: form.referred_by,
            photo,
        },
        now_millis(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            member: member.view(),
            message: "Registration successful. Verify your email to activate the account."
                .to_string(),
        }),
    ))
}
