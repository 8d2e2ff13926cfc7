//! Module for checks that run before a request is sent.

use thiserror::Error;

/// Minimum number of characters of a password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Input rejected on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {} characters long", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,
    #[error("password must contain an uppercase letter")]
    PasswordMissingUppercase,
    #[error("password must contain a lowercase letter")]
    PasswordMissingLowercase,
    #[error("password must contain a digit")]
    PasswordMissingDigit,
}

pub fn not_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Missing(field))
    } else {
        Ok(())
    }
}

pub fn name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    not_empty(field, value)
}

/// Checks that the value looks like `local@domain.tld`.
pub fn email(value: &str) -> Result<(), ValidationError> {
    not_empty("email", value)?;
    let (local, domain) = value
        .split_once('@')
        .ok_or(ValidationError::InvalidEmail)?;
    let valid = !local.is_empty()
        && !value.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && domain
            .split_once('.')
            .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

pub fn password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Missing("password"));
    }
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if !value.chars().any(char::is_uppercase) {
        return Err(ValidationError::PasswordMissingUppercase);
    }
    if !value.chars().any(char::is_lowercase) {
        return Err(ValidationError::PasswordMissingLowercase);
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }
    Ok(())
}
