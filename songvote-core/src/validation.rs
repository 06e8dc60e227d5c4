use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// YouTube video ids are always 11 characters of url-safe base64.
    pub static ref VIDEO_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
}

/// Minimum amount of digits a phone number must have to be accepted
const MIN_PHONE_DIGITS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field was missing or blank
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("\"{0}\" is not a valid video id")]
    MalformedVideoId(String),
    #[error("\"{0}\" is not a valid id")]
    MalformedId(String),
    #[error("\"{0}\" is not a valid phone number")]
    MalformedPhone(String),
}

/// Trims a required field, failing if nothing is left.
pub fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    Ok(trimmed.to_string())
}

/// Trims an optional field, treating blank values as absent.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Normalizes a phone number to its digits, keeping a leading `+`.
/// Blank input is treated as no phone number.
pub fn normalize_phone(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = optional_text(value) else {
        return Ok(None);
    };

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let has_foreign_chars = raw
        .chars()
        .any(|c| !(c.is_ascii_digit() || " +-().".contains(c)));

    if has_foreign_chars || digits.len() < MIN_PHONE_DIGITS {
        return Err(ValidationError::MalformedPhone(raw));
    }

    if raw.starts_with('+') {
        Ok(Some(format!("+{}", digits)))
    } else {
        Ok(Some(digits))
    }
}
