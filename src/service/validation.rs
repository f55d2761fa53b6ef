//! Input validation rules for the JSON API.

use crate::error::{ApiError, AppError};
use regex::Regex;

const EMAIL_PATTERN: &str = r"^[a-z0-9\.\-\_]+\@[a-z0-9\-\_]+(\.[a-z0-9\-\_]+){1,4}$";
const SHA1_PATTERN: &str = r"^[0-9a-f]{40}$";

fn matches(pattern: &str, value: &str) -> Result<bool, AppError> {
    let re = Regex::new(pattern).map_err(|e| AppError::Internal(format!("invalid pattern: {}", e)))?;
    Ok(re.is_match(value))
}

/// Non-blank text, else `value:invalid` on `field`.
pub fn require_text(field: &str, value: &str, message: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(ApiError::value(field, message).into());
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), AppError> {
    if value.is_empty() || !matches(EMAIL_PATTERN, value)? {
        return Err(ApiError::value("email", "Invalid email.").into());
    }
    Ok(())
}

/// Client-side password digest: 40 lowercase hex chars.
pub fn validate_password_digest(value: &str) -> Result<(), AppError> {
    if value.is_empty() || !matches(SHA1_PATTERN, value)? {
        return Err(ApiError::value("passwd", "Invalid password.").into());
    }
    Ok(())
}
