/*!
 * # Password Policy Module
 *
 * Complexity rules applied to passwords chosen at signup and on reset.
 * Login deliberately does not re-check them so older passwords keep working.
 */

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use thiserror::Error;
use validator::ValidationError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min_length} characters")]
    TooShort { min_length: usize },

    #[error("Password must be at most {max_length} characters")]
    TooLong { max_length: usize },

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one digit")]
    MissingNumber,

    #[error("Password must contain at least one special character")]
    MissingSpecialChar,
}

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_numbers: bool,
    pub require_special_chars: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 100,
            require_uppercase: true,
            require_lowercase: true,
            require_numbers: true,
            require_special_chars: true,
        }
    }
}

lazy_static! {
    static ref UPPERCASE: Regex = Regex::new(r"[A-Z]").unwrap();
    static ref LOWERCASE: Regex = Regex::new(r"[a-z]").unwrap();
    static ref DIGIT: Regex = Regex::new(r"[0-9]").unwrap();
    static ref SPECIAL: Regex = Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).unwrap();
}

impl PasswordPolicy {
    /// Returns the first rule the password breaks, checked in a fixed order.
    pub fn validate(&self, password: &str) -> Result<(), PasswordPolicyError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }
        if length > self.max_length {
            return Err(PasswordPolicyError::TooLong {
                max_length: self.max_length,
            });
        }
        if self.require_uppercase && !UPPERCASE.is_match(password) {
            return Err(PasswordPolicyError::MissingUppercase);
        }
        if self.require_lowercase && !LOWERCASE.is_match(password) {
            return Err(PasswordPolicyError::MissingLowercase);
        }
        if self.require_numbers && !DIGIT.is_match(password) {
            return Err(PasswordPolicyError::MissingNumber);
        }
        if self.require_special_chars && !SPECIAL.is_match(password) {
            return Err(PasswordPolicyError::MissingSpecialChar);
        }
        Ok(())
    }
}

/// `validator` hook applying the default policy.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    PasswordPolicy::default().validate(password).map_err(|e| {
        let mut err = ValidationError::new("password_policy");
        err.message = Some(Cow::Owned(e.to_string()));
        err
    })
}
