//! Verification code records

use serde::{Deserialize, Serialize};

/// What a verification code proves control of the email for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPurpose {
    Registration,
    PasswordReset,
}

impl VerificationPurpose {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// One active code per (email, purpose); a newer issuance overwrites the row.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VerificationRecord {
    pub email: String,
    pub purpose: String,
    /// Random id of this issuance; consumption only deletes the same issuance
    pub issue_id: i64,
    /// argon2 hash of the 6-digit code
    pub code_hash: String,
    pub attempts: i32,
    pub expires_at: i64,
    pub created_at: i64,
}

impl VerificationRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}
