//! POST /api/donation-process
//!
//! Guests are matched to an existing member by email or mobile, or get a new
//! account whose generated password is returned once in `temporaryPassword`
//! and mailed once. Logged-in donors must send their bearer token and the
//! `memberId` it belongs to.

use axum::Json;
use axum::extract::State;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{Donation, DonationStatus, DonorSnapshot, MemberView};
use validator::Validate;

use crate::auth::member_auth::identity_from_headers;
use crate::db::PaymentMeta;
use crate::services::donations::{self, DonationRequest};
use crate::state::AppState;
use crate::util::{normalize_email, now_millis};
use crate::validation::{self, validate_aadhar, validate_mobile, validate_pan};

use super::{ApiJson, ApiResult};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DonorData {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_pan"))]
    pub pan: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_aadhar"))]
    pub aadhar: Option<String>,
    pub amount: i64,
    #[serde(default)]
    pub purpose: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentData {
    pub payment_mode: Option<String>,
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub signature: Option<String>,
    /// Gateway outcome; absent means the (mocked) gateway completed
    pub status: Option<DonationStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationProcessRequest {
    pub donor_data: DonorData,
    #[serde(default)]
    pub payment_data: PaymentData,
    #[serde(default)]
    pub is_logged_in: bool,
    #[serde(default)]
    pub member_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationProcessResponse {
    pub success: bool,
    pub donation: Donation,
    pub member: MemberView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_member: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
    pub message: String,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn process_donation(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<DonationProcessRequest>,
) -> ApiResult<DonationProcessResponse> {
    let mut donor = req.donor_data;
    donor.email = normalize_email(&donor.email);
    donor.name = donor.name.trim().to_string();
    donor.mobile = donor.mobile.trim().to_string();
    donor.pan = blank_to_none(donor.pan).map(|p| p.to_uppercase());
    donor.aadhar = blank_to_none(donor.aadhar);
    validation::check(&donor)?;

    let member_id = if req.is_logged_in {
        let identity = identity_from_headers(&headers, &state.jwt_secret)?;
        if req.member_id.is_some_and(|id| id != identity.member_id) {
            return Err(AppError::permission_denied(
                "memberId does not match the signed-in member",
            ));
        }
        Some(identity.member_id)
    } else {
        None
    };

    let payment = req.payment_data;
    let request = DonationRequest {
        donor: DonorSnapshot {
            name: donor.name,
            email: donor.email,
            mobile: donor.mobile,
            address: blank_to_none(donor.address),
            pan: donor.pan,
            aadhar: donor.aadhar,
        },
        amount: donor.amount,
        purpose: donor.purpose.unwrap_or_default(),
        payment: PaymentMeta {
            mode: payment.payment_mode,
            transaction_id: payment.transaction_id,
            order_id: payment.order_id,
            signature: payment.signature,
        },
        status: payment.status.unwrap_or(DonationStatus::Completed),
    };

    let outcome = donations::process(&state, request, member_id, now_millis()).await?;

    let message = if outcome.new_member {
        "Donation successful. A member account has been created and the login details were emailed."
    } else {
        "Donation successful. Thank you for your support."
    };

    Ok(Json(DonationProcessResponse {
        success: true,
        member: outcome.member.view(),
        new_member: outcome.new_member.then_some(true),
        temporary_password: outcome.temporary_password.map(|p| p.into_inner()),
        donation: outcome.donation,
        message: message.to_string(),
    }))
}
