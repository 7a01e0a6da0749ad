//! Query parameter structs for the board endpoints

use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Posts per page on every listing.
pub const PAGE_SIZE: usize = 10;

/// Helper to deserialize numbers from query string (which are always strings)
fn deserialize_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.is_empty() => s.parse().map_err(D::Error::custom),
        _ => Ok(T::default()),
    }
}

/// `?pageNumber=N`, zero-based, default 0
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default, deserialize_with = "deserialize_from_str")]
    pub page_number: usize,
}

/// `?title=T&pageNumber=N`
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_from_str")]
    pub page_number: usize,
}

/// `?postId=N`
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommentQuery {
    #[serde(default, deserialize_with = "deserialize_from_str")]
    pub post_id: i64,
}
