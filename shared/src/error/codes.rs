//! Unified error codes for the foundation services
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Member errors
//! - 4xxx: Verification code errors
//! - 5xxx: Donation errors
//! - 6xxx: Upload errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a bare `u16` so web clients can switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Too many requests from this client
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    /// Member is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is suspended
    AccountSuspended = 1005,
    /// Email not verified yet
    EmailNotVerified = 1006,
    /// Password too short
    PasswordTooShort = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Member ====================
    /// Member not found
    MemberNotFound = 3001,
    /// Email already belongs to a member
    EmailAlreadyRegistered = 3002,
    /// Mobile number already belongs to a member
    MobileAlreadyRegistered = 3003,
    /// Allocated membership id collided with an existing one
    MembershipIdConflict = 3004,
    /// Referrer membership id does not exist
    InvalidReferrer = 3005,
    /// Member exists but has not verified the email yet
    RegistrationPendingVerification = 3006,

    // ==================== 4xxx: Verification ====================
    /// No active verification code for this email
    VerificationCodeNotFound = 4001,
    /// Verification code expired
    VerificationCodeExpired = 4002,
    /// Verification code does not match
    VerificationCodeInvalid = 4003,
    /// Too many verification attempts
    TooManyAttempts = 4004,
    /// Password reset token invalid or already used
    ResetTokenInvalid = 4005,

    // ==================== 5xxx: Donation ====================
    /// Amount below configured minimum
    AmountBelowMinimum = 5001,
    /// Payment was not confirmed by the gateway
    PaymentNotCompleted = 5003,

    // ==================== 6xxx: Upload ====================
    /// File too large
    FileTooLarge = 6001,
    /// Unsupported file format
    UnsupportedFileFormat = 6002,
    /// Empty file provided
    EmptyFile = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Mail transport refused or failed the message
    EmailDeliveryFailed = 9003,
    /// File storage failed
    FileStorageFailed = 9005,
}

impl ErrorCode {
    /// Numeric value of this code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default human-readable message
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "Member is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountSuspended => "Account is suspended",
            ErrorCode::EmailNotVerified => "Email not verified",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Member
            ErrorCode::MemberNotFound => "Member not found",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",
            ErrorCode::MobileAlreadyRegistered => "Mobile number is already registered",
            ErrorCode::MembershipIdConflict => "Membership id already allocated, please retry",
            ErrorCode::InvalidReferrer => "Referrer membership id does not exist",
            ErrorCode::RegistrationPendingVerification => {
                "Email is registered but not verified yet"
            }

            // Verification
            ErrorCode::VerificationCodeNotFound => "No active verification code, request a new one",
            ErrorCode::VerificationCodeExpired => "Verification code has expired",
            ErrorCode::VerificationCodeInvalid => "Invalid verification code",
            ErrorCode::TooManyAttempts => "Too many attempts, request a new code",
            ErrorCode::ResetTokenInvalid => "Password reset token is invalid or has expired",

            // Donation
            ErrorCode::AmountBelowMinimum => "Donation amount is below the minimum",
            ErrorCode::PaymentNotCompleted => "Payment was not completed",

            // Upload
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::EmptyFile => "Empty file provided",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::EmailDeliveryFailed => "Failed to send email, please retry",
            ErrorCode::FileStorageFailed => "File storage failed",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            9 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::AccountSuspended),
            1006 => Ok(ErrorCode::EmailNotVerified),
            1007 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Member
            3001 => Ok(ErrorCode::MemberNotFound),
            3002 => Ok(ErrorCode::EmailAlreadyRegistered),
            3003 => Ok(ErrorCode::MobileAlreadyRegistered),
            3004 => Ok(ErrorCode::MembershipIdConflict),
            3005 => Ok(ErrorCode::InvalidReferrer),
            3006 => Ok(ErrorCode::RegistrationPendingVerification),

            // Verification
            4001 => Ok(ErrorCode::VerificationCodeNotFound),
            4002 => Ok(ErrorCode::VerificationCodeExpired),
            4003 => Ok(ErrorCode::VerificationCodeInvalid),
            4004 => Ok(ErrorCode::TooManyAttempts),
            4005 => Ok(ErrorCode::ResetTokenInvalid),

            // Donation
            5001 => Ok(ErrorCode::AmountBelowMinimum),
            5003 => Ok(ErrorCode::PaymentNotCompleted),

            // Upload
            6001 => Ok(ErrorCode::FileTooLarge),
            6002 => Ok(ErrorCode::UnsupportedFileFormat),
            6003 => Ok(ErrorCode::EmptyFile),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::EmailDeliveryFailed),
            9005 => Ok(ErrorCode::FileStorageFailed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::TooManyRequests.code(), 9);
        assert_eq!(ErrorCode::InvalidCredentials.code(), 1002);
        assert_eq!(ErrorCode::InvalidReferrer.code(), 3005);
        assert_eq!(ErrorCode::VerificationCodeExpired.code(), 4002);
        assert_eq!(ErrorCode::AmountBelowMinimum.code(), 5001);
        assert_eq!(ErrorCode::EmailDeliveryFailed.code(), 9003);
    }

    #[test]
    fn test_try_from_matches_code() {
        let all = [
            ErrorCode::TooManyRequests,
            ErrorCode::PasswordTooShort,
            ErrorCode::RegistrationPendingVerification,
            ErrorCode::ResetTokenInvalid,
            ErrorCode::PaymentNotCompleted,
            ErrorCode::EmptyFile,
            ErrorCode::FileStorageFailed,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_unknown_value() {
        assert_eq!(ErrorCode::try_from(7777), Err(InvalidErrorCode(7777)));
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::InvalidReferrer).unwrap();
        assert_eq!(json, "3005");
        let back: ErrorCode = serde_json::from_str("4003").unwrap();
        assert_eq!(back, ErrorCode::VerificationCodeInvalid);
        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::MemberNotFound.to_string(), "3001");
    }
}
