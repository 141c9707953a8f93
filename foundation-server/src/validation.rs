//! Field rules for request payloads
//!
//! Request structs derive `validator::Validate` and point their custom rules
//! at the functions here. [`check`] turns the collected errors into one
//! `ValidationFailed` error listing the offending fields.

use std::borrow::Cow;

use shared::error::{AppError, ErrorCode};
use validator::{Validate, ValidationError, ValidationErrors};

pub const MIN_PASSWORD_LEN: usize = 8;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// 10-digit Indian mobile number starting with 6-9
pub fn validate_mobile(mobile: &str) -> Result<(), ValidationError> {
    let ok = mobile.len() == 10
        && mobile.bytes().all(|b| b.is_ascii_digit())
        && matches!(mobile.as_bytes()[0], b'6'..=b'9');
    if ok {
        Ok(())
    } else {
        Err(invalid("mobile", "Mobile number must be 10 digits starting with 6-9"))
    }
}

/// PAN: five letters, four digits, one letter (upper case)
pub fn validate_pan(pan: &str) -> Result<(), ValidationError> {
    let b = pan.as_bytes();
    let ok = b.len() == 10
        && b[..5].iter().all(u8::is_ascii_uppercase)
        && b[5..9].iter().all(u8::is_ascii_digit)
        && b[9].is_ascii_uppercase();
    if ok {
        Ok(())
    } else {
        Err(invalid("pan", "PAN must look like ABCDE1234F"))
    }
}

/// Aadhaar: 12 digits
pub fn validate_aadhar(aadhar: &str) -> Result<(), ValidationError> {
    if aadhar.len() == 12 && aadhar.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid("aadhar", "Aadhaar number must be 12 digits"))
    }
}

/// Six-digit numeric code
pub fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    if otp.len() == 6 && otp.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid("otp", "Verification code must be 6 digits"))
    }
}

pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::with_message(
            ErrorCode::PasswordTooShort,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// Run derived validation and convert failures
pub fn check<T: Validate>(value: &T) -> Result<(), AppError> {
    value.validate().map_err(to_app_error)
}

pub fn to_app_error(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{field} is invalid"));
            (field.to_string(), message)
        })
        .collect();
    fields.sort();

    let message = fields
        .first()
        .map(|(_, m)| m.clone())
        .unwrap_or_else(|| ErrorCode::ValidationFailed.message().to_string());
    let names: Vec<String> = fields.into_iter().map(|(f, _)| f).collect();
    AppError::validation(message).with_detail("fields", names)
}
