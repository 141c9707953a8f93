//! Login, password change and password reset

use shared::error::{AppError, ErrorCode};
use shared::models::{Member, MemberStatus, VerificationPurpose};

use crate::auth::{member_auth, verification_token};
use crate::error::{ServiceError, ServiceResult};
use crate::services::verification;
use crate::state::AppState;
use crate::util::{generate_code, hash_password, verify_password};
use crate::validation::validate_password_strength;

/// Check credentials and mint a session token
pub async fn login(state: &AppState, email: &str, password: &str) -> ServiceResult<(Member, String)> {
    let member = state
        .store
        .find_member_by_email(email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(password, &member.hashed_password) {
        tracing::info!(member_id = member.id, "Login rejected: wrong password");
        return Err(AppError::invalid_credentials().into());
    }

    match member.status() {
        MemberStatus::Verified => {}
        MemberStatus::PendingVerification => {
            return Err(AppError::new(ErrorCode::EmailNotVerified)
                .with_detail("action", "verify_otp")
                .with_detail("email", member.email.as_str())
                .into());
        }
        MemberStatus::Suspended => return Err(AppError::new(ErrorCode::AccountSuspended).into()),
    }

    let token = member_auth::create_token(&member, &state.jwt_secret)
        .map_err(|e| AppError::internal(format!("Failed to create token: {e}")))?;

    tracing::info!(member_id = member.id, "Member logged in");
    Ok((member, token))
}

pub async fn change_password(
    state: &AppState,
    member_id: i64,
    current_password: &str,
    new_password: &str,
    now: i64,
) -> ServiceResult<()> {
    let member = state
        .store
        .find_member_by_id(member_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;

    if !verify_password(current_password, &member.hashed_password) {
        return Err(AppError::with_message(
            ErrorCode::InvalidCredentials,
            "Current password is incorrect",
        )
        .into());
    }
    validate_password_strength(new_password)?;

    let hashed = hash_password(new_password)?;
    state
        .store
        .update_password(member.id, &hashed, false, now)
        .await?;

    tracing::info!(member_id = member.id, "Password changed");
    Ok(())
}

/// Mail a reset code when the email belongs to a member.
///
/// Every email gets the same answer so the endpoint does not reveal which
/// addresses are registered: unknown emails succeed silently after the same
/// hashing work, and a failed send is logged rather than returned.
pub async fn send_reset_code(state: &AppState, email: &str, now: i64) -> ServiceResult<()> {
    let Some(member) = state.store.find_member_by_email(email).await? else {
        hash_password(&generate_code())?;
        tracing::debug!(email = %email, "Password reset requested for unknown email");
        return Ok(());
    };
    match verification::issue(
        state,
        email,
        VerificationPurpose::PasswordReset,
        Some(&member.name),
        now,
    )
    .await
    {
        Err(ServiceError::App(e)) if e.code == ErrorCode::EmailDeliveryFailed => {
            tracing::warn!(member_id = member.id, "Reset code stored but not delivered");
            Ok(())
        }
        other => other,
    }
}

/// Verify a reset code and return a reset token bound to the current password hash
pub async fn verify_reset_code(
    state: &AppState,
    email: &str,
    code: &str,
    now: i64,
) -> ServiceResult<String> {
    verification::verify(state, email, VerificationPurpose::PasswordReset, code, now).await?;

    let member = state
        .store
        .find_member_by_email(email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::VerificationCodeNotFound))?;

    let token = verification_token::issue(
        &state.jwt_secret,
        email,
        VerificationPurpose::PasswordReset,
        Some(verification_token::fingerprint(&member.hashed_password)),
        now,
    )
    .map_err(|e| AppError::internal(format!("Failed to create reset token: {e}")))?;
    Ok(token)
}

/// Set a new password using a reset token; clears forced rotation
pub async fn reset_password(
    state: &AppState,
    email: &str,
    new_password: &str,
    token: &str,
    now: i64,
) -> ServiceResult<()> {
    let member = state
        .store
        .find_member_by_email(email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ResetTokenInvalid))?;

    let fp = verification_token::fingerprint(&member.hashed_password);
    verification_token::validate(
        &state.jwt_secret,
        token,
        email,
        VerificationPurpose::PasswordReset,
        Some(&fp),
    )?;
    validate_password_strength(new_password)?;

    let hashed = hash_password(new_password)?;
    state
        .store
        .update_password(member.id, &hashed, false, now)
        .await?;

    tracing::info!(member_id = member.id, "Password reset");
    Ok(())
}
