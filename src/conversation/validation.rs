//! Contact data checks applied before a user record is saved.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::{AppError, AppResult};

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9()\- ]+$").expect("phone regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email regex"));

/// Accepts `+`, digits, spaces, dashes and parentheses with 7 to 15 digits.
/// Returns the trimmed input.
pub fn validate_phone(input: &str) -> AppResult<String> {
    let phone = input.trim();
    if !PHONE_RE.is_match(phone) {
        return Err(AppError::InvalidInput(format!("'{}' is not a phone number", phone)));
    }
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err(AppError::InvalidInput(
            "phone number must contain 7 to 15 digits".to_string(),
        ));
    }
    Ok(phone.to_string())
}

/// Accepts `local@domain.tld`. Returns the trimmed input.
pub fn validate_email(input: &str) -> AppResult<String> {
    let email = input.trim();
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::InvalidInput(format!("'{}' is not an e-mail address", email)));
    }
    Ok(email.to_string())
}
