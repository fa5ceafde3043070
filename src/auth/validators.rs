//! `validator` hooks shared by the auth request bodies.

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Ten-digit mobile number.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if !DIGITS.is_match(phone) {
        return Err(invalid("phone", "Phone number must contain only digits"));
    }
    if phone.len() != 10 {
        return Err(invalid("phone", "Phone number must be exactly 10 digits"));
    }
    Ok(())
}

pub fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    if !DIGITS.is_match(otp) {
        return Err(invalid("otp", "OTP must contain only digits"));
    }
    if !(4..=9).contains(&otp.len()) {
        return Err(invalid("otp", "OTP must be between 4 and 9 digits"));
    }
    Ok(())
}

pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if length < 2 {
        return Err(invalid(
            "full_name",
            "Full name must be at least 2 characters",
        ));
    }
    if length > 100 {
        return Err(invalid(
            "full_name",
            "Full name must be at most 100 characters",
        ));
    }
    Ok(())
}

/// Loose shape check: an `@` followed somewhere by a `.`.
pub fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    if is_email_like(email) {
        Ok(())
    } else {
        Err(invalid("email", "Please enter a valid email address"))
    }
}

pub fn is_email_like(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

/// Ten digits means a phone number, anything else is treated as an email.
pub fn looks_like_phone(identifier: &str) -> bool {
    identifier.len() == 10 && DIGITS.is_match(identifier)
}
