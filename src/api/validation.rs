//! Request field validation

use crate::api::handlers::AppError;
use crate::messages::Messages;
use regex::Regex;
use std::sync::LazyLock;

/// Local part of letters, digits and `+_.-`; domain ending in an alphabetic TLD.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email pattern")
});

static PASSWORD_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{8,20}$").expect("valid password pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// 8 to 20 ASCII letters and digits, with at least one of each.
pub fn is_valid_password(password: &str) -> bool {
    PASSWORD_CHARS.is_match(password)
        && password.bytes().any(|b| b.is_ascii_alphabetic())
        && password.bytes().any(|b| b.is_ascii_digit())
}

/// Field checks that turn into a 400 with a catalog message.
pub struct Validator<'a> {
    messages: &'a Messages,
}

impl<'a> Validator<'a> {
    pub fn new(messages: &'a Messages) -> Self {
        Self { messages }
    }

    fn reject(&self, field: &str, key: &str) -> AppError {
        AppError::BadRequest(format!("{}: {}", field, self.messages.get(key)))
    }

    pub fn email(&self, email: &str) -> Result<(), AppError> {
        if is_valid_email(email) {
            Ok(())
        } else {
            Err(self.reject("email", "validation.email"))
        }
    }

    pub fn password(&self, password: &str) -> Result<(), AppError> {
        if is_valid_password(password) {
            Ok(())
        } else {
            Err(self.reject("password", "validation.password"))
        }
    }

    pub fn not_blank(&self, field: &str, value: &str) -> Result<(), AppError> {
        if value.trim().is_empty() {
            Err(self.reject(field, "validation.notBlank"))
        } else {
            Ok(())
        }
    }

    pub fn positive(&self, field: &str, value: i64) -> Result<(), AppError> {
        if value > 0 {
            Ok(())
        } else {
            Err(self.reject(field, "validation.positive"))
        }
    }
}
