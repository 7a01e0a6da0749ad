//! User-facing message catalog.
//!
//! Constructed once at startup for the configured locale and carried in the
//! server state, so handlers resolve text through the instance they were given.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported catalog languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ko" => Ok(Locale::Ko),
            other => Err(format!("unknown locale '{}' (expected en or ko)", other)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Ko => write!(f, "ko"),
        }
    }
}

const EN: &[(&str, &str)] = &[
    ("common.success", "success"),
    ("common.notFound", "resource not found"),
    ("common.forbidden", "you do not have permission for this resource"),
    ("common.unauthenticated", "authentication required"),
    ("common.internal", "internal server error"),
    ("user.email.password.incorrect", "incorrect email or password"),
    ("user.email.exists", "email is already registered"),
    ("auth.logout.success", "signed out"),
    ("auth.token.invalid", "invalid or expired token"),
    ("validation.email", "invalid email format"),
    (
        "validation.password",
        "password must be 8 to 20 characters and combine letters and digits",
    ),
    ("validation.notBlank", "must not be blank"),
    ("validation.positive", "must be a positive number"),
];

const KO: &[(&str, &str)] = &[
    ("common.success", "성공"),
    ("common.notFound", "리소스를 찾을 수 없습니다"),
    ("common.forbidden", "권한이 없습니다"),
    ("common.unauthenticated", "인증이 필요합니다"),
    ("common.internal", "서버 내부 오류가 발생했습니다"),
    ("user.email.password.incorrect", "이메일 또는 비밀번호가 올바르지 않습니다"),
    ("user.email.exists", "이미 가입된 이메일입니다"),
    ("auth.logout.success", "로그아웃 되었습니다"),
    ("auth.token.invalid", "유효하지 않거나 만료된 토큰입니다"),
    ("validation.email", "이메일 형식이 올바르지 않습니다"),
    (
        "validation.password",
        "비밀번호는 8~20자 이내이며 영문과 숫자 조합이어야 합니다",
    ),
    ("validation.notBlank", "공백일 수 없습니다"),
    ("validation.positive", "양수여야 합니다"),
];

/// Message lookup for one locale.
#[derive(Debug, Clone)]
pub struct Messages {
    locale: Locale,
    table: HashMap<&'static str, &'static str>,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        let entries = match locale {
            Locale::En => EN,
            Locale::Ko => KO,
        };
        Self {
            locale,
            table: entries.iter().copied().collect(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Resolve `key`. Unknown keys resolve to the key itself.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.table.get(key).copied().unwrap_or(key)
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}
