//! Member login and dashboard
//!
//! `/api/member-login` is public; the `/api/member/*` routes run behind
//! `member_auth_middleware` and read the caller from [`MemberIdentity`].

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::{Donation, MemberView};
use validator::Validate;

use crate::auth::MemberIdentity;
use crate::error::ServiceError;
use crate::services::accounts;
use crate::services::referral::{self, ReferralOverview};
use crate::state::AppState;
use crate::util::{normalize_email, now_millis};
use crate::validation;

use super::{ApiJson, ApiResult};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub member: MemberView,
    pub must_change_password: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct DonationList {
    pub donations: Vec<Donation>,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    req.email = normalize_email(&req.email);
    validation::check(&req)?;

    let (member, token) = accounts::login(&state, &req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        token,
        must_change_password: member.must_change_password,
        member: member.view(),
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(identity): Extension<MemberIdentity>,
) -> ApiResult<MemberView> {
    let member = state
        .store
        .find_member_by_id(identity.member_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
    Ok(Json(member.view()))
}

pub async fn donations(
    State(state): State<AppState>,
    Extension(identity): Extension<MemberIdentity>,
) -> ApiResult<DonationList> {
    let donations = state
        .store
        .list_donations_by_member(identity.member_id)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(DonationList { donations }))
}

pub async fn referrals(
    State(state): State<AppState>,
    Extension(identity): Extension<MemberIdentity>,
) -> ApiResult<ReferralOverview> {
    let member = state
        .store
        .find_member_by_id(identity.member_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;

    let overview = referral::overview(state.store.as_ref(), member.id, member.referral_count).await?;
    Ok(Json(overview))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(identity): Extension<MemberIdentity>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Value> {
    accounts::change_password(
        &state,
        identity.member_id,
        &req.current_password,
        &req.new_password,
        now_millis(),
    )
    .await?;
    Ok(Json(json!({ "success": true, "message": "Password changed" })))
}
