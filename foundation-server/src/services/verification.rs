//! Verification code issuer
//!
//! One active code per (email, purpose). Issuing replaces the previous code.
//! Verifying checks expiry, then the attempt budget, then the code, and on a
//! match deletes the row only if it is still the same issuance, so a code
//! verifies at most once.

use shared::error::{AppError, ErrorCode};
use shared::models::VerificationPurpose;

use crate::db::NewVerification;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::util::{generate_code, hash_password, snowflake_id, verify_password};

/// Wrong submissions allowed before the code is discarded
pub const MAX_ATTEMPTS: i32 = 5;

/// Why a submitted code was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyFailure {
    /// No active code for this email and purpose
    NotFound,
    Expired,
    Mismatch,
    TooManyAttempts,
}

impl From<VerifyFailure> for AppError {
    fn from(f: VerifyFailure) -> Self {
        AppError::new(match f {
            VerifyFailure::NotFound => ErrorCode::VerificationCodeNotFound,
            VerifyFailure::Expired => ErrorCode::VerificationCodeExpired,
            VerifyFailure::Mismatch => ErrorCode::VerificationCodeInvalid,
            VerifyFailure::TooManyAttempts => ErrorCode::TooManyAttempts,
        })
    }
}

/// Generate and store a fresh code, superseding any earlier one. Returns the plaintext code.
pub async fn store_code(
    state: &AppState,
    email: &str,
    purpose: VerificationPurpose,
    now: i64,
) -> ServiceResult<String> {
    let code = generate_code();
    let record = NewVerification {
        email: email.to_string(),
        purpose,
        issue_id: snowflake_id(),
        code_hash: hash_password(&code)?,
        expires_at: now + state.otp_ttl_secs * 1000,
        now,
    };
    state.store.upsert_verification(&record).await?;
    Ok(code)
}

/// Store a code and mail it.
///
/// A delivery failure surfaces as `EmailDeliveryFailed`; the stored code stays
/// in place and a resend supersedes it.
pub async fn issue(
    state: &AppState,
    email: &str,
    purpose: VerificationPurpose,
    name: Option<&str>,
    now: i64,
) -> ServiceResult<()> {
    let code = store_code(state, email, purpose, now).await?;
    let ttl_minutes = state.otp_ttl_secs / 60;

    let sent = match purpose {
        VerificationPurpose::Registration => {
            state
                .email
                .send_verification_code(email, name, &code, ttl_minutes)
                .await
        }
        VerificationPurpose::PasswordReset => {
            state
                .email
                .send_password_reset_code(email, name.unwrap_or("Member"), &code, ttl_minutes)
                .await
        }
    };

    if let Err(e) = sent {
        tracing::error!(email = %email, purpose = purpose.as_db(), error = %e, "Failed to send verification code");
        return Err(AppError::new(ErrorCode::EmailDeliveryFailed).into());
    }

    tracing::info!(email = %email, purpose = purpose.as_db(), "Verification code issued");
    Ok(())
}

/// Check a submitted code and consume it on success
pub async fn verify(
    state: &AppState,
    email: &str,
    purpose: VerificationPurpose,
    code: &str,
    now: i64,
) -> ServiceResult<()> {
    let record = state
        .store
        .find_verification(email, purpose)
        .await?
        .ok_or(VerifyFailure::NotFound)
        .map_err(AppError::from)?;

    if record.is_expired(now) {
        return Err(AppError::from(VerifyFailure::Expired).into());
    }

    if record.attempts >= MAX_ATTEMPTS {
        state
            .store
            .consume_verification(email, purpose, record.issue_id)
            .await?;
        tracing::warn!(email = %email, purpose = purpose.as_db(), "Verification code discarded after too many attempts");
        return Err(AppError::from(VerifyFailure::TooManyAttempts).into());
    }

    // Count the attempt before comparing so concurrent guesses share one budget
    state
        .store
        .increment_verification_attempts(email, purpose, record.issue_id)
        .await?;

    if !verify_password(code, &record.code_hash) {
        return Err(AppError::from(VerifyFailure::Mismatch).into());
    }

    if !state
        .store
        .consume_verification(email, purpose, record.issue_id)
        .await?
    {
        // Superseded or consumed by a concurrent request
        return Err(AppError::from(VerifyFailure::NotFound).into());
    }

    tracing::info!(email = %email, purpose = purpose.as_db(), "Verification code accepted");
    Ok(())
}
