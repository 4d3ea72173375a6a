use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

const NAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 8;

pub fn validate_name(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::invalid(format!("{field} is required")));
    }
    if value.chars().count() > NAME_MAX {
        return Err(AppError::invalid(format!(
            "{field} must be at most {NAME_MAX} characters"
        )));
    }
    Ok(value.to_string())
}

/// Returns the trimmed, lower-cased address.
pub fn validate_email(value: &str) -> AppResult<String> {
    let email = value.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::invalid("email is not a valid email address"));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(AppError::invalid(format!(
            "Password must be at least {PASSWORD_MIN} characters."
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::invalid(
            "Password must contain at least one uppercase letter.",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::invalid(
            "Password must contain at least one lowercase letter.",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::invalid("Password must contain at least one digit."));
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::invalid(
            "Password must contain at least one special character.",
        ));
    }
    Ok(())
}

/// Empty strings in optional text fields count as "not provided".
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
