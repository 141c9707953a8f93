//! Short-lived tokens proving a recent successful code verification
//!
//! Issued by `verify-password-reset-otp` and redeemed by `reset-password`.
//! A token can carry a fingerprint of state it must still match when it is
//! redeemed; for password resets that is the current password hash, so the
//! token dies as soon as the password changes.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::error::{AppError, ErrorCode};
use shared::models::VerificationPurpose;

pub const TOKEN_TTL_SECS: i64 = 15 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationClaims {
    /// Verified email
    pub sub: String,
    pub purpose: VerificationPurpose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fp: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// First 16 hex chars of SHA-256 over `value`
pub fn fingerprint(value: &str) -> String {
    let digest = hex::encode(Sha256::digest(value.as_bytes()));
    digest[..16].to_string()
}

pub fn issue(
    secret: &str,
    email: &str,
    purpose: VerificationPurpose,
    fingerprint: Option<String>,
    now_millis: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = now_millis / 1000;
    let claims = VerificationClaims {
        sub: email.to_string(),
        purpose,
        fp: fingerprint,
        exp: (now + TOKEN_TTL_SECS) as usize,
        iat: now as usize,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Check signature, expiry, subject, purpose and (when given) fingerprint
pub fn validate(
    secret: &str,
    token: &str,
    email: &str,
    purpose: VerificationPurpose,
    fingerprint: Option<&str>,
) -> Result<(), AppError> {
    let invalid = || AppError::new(ErrorCode::ResetTokenInvalid);

    let data = jsonwebtoken::decode::<VerificationClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Verification token rejected: {e}");
        invalid()
    })?;

    let claims = data.claims;
    if claims.sub != email || claims.purpose != purpose {
        return Err(invalid());
    }
    if claims.fp.as_deref() != fingerprint {
        return Err(invalid());
    }
    Ok(())
}
