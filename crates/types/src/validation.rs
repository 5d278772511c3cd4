//! Input validation shared by every creation and update payload.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
    #[error("{field} is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error("at least one field must be provided")]
    EmptyUpdate,
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Rejects empty or whitespace-only strings.
pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

pub fn min_length(field: &'static str, value: &str, min: usize) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(())
}

/// Six ASCII digits, as produced by authenticator apps.
pub fn totp_token(field: &'static str, value: &str) -> Result<(), ValidationError> {
    required(field, value)?;
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::Invalid {
            field,
            reason: "must be six digits",
        });
    }
    Ok(())
}

pub fn http_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    required(field, value)?;
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ValidationError::Invalid {
            field,
            reason: "must be an http or https URL",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        assert_eq!(required("name", "  "), Err(ValidationError::Required("name")));
        assert!(required("name", "x").is_ok());
    }

    #[test]
    fn totp_token_requires_six_digits() {
        assert!(totp_token("totp_token", "123456").is_ok());
        assert!(totp_token("totp_token", "12345").is_err());
        assert!(totp_token("totp_token", "12345a").is_err());
    }

    #[test]
    fn http_url_checks_scheme() {
        assert!(http_url("url", "https://example.com/hook").is_ok());
        assert!(http_url("url", "ftp://example.com").is_err());
    }
}
