//! Records persisted by the stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authorization role granted to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberRole {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::User => "ROLE_USER",
            MemberRole::Admin => "ROLE_ADMIN",
        }
    }
}

/// Account record. The email is the token subject.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: i64,
    pub email: String,
    /// bcrypt hash, never serialized
    pub password_hash: String,
    pub roles: Vec<MemberRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to register a member; id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<MemberRole>,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub member_id: i64,
    pub like_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PostComment {
    pub id: i64,
    pub post_id: i64,
    pub member_id: i64,
    pub member_email: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

/// One page of a listing, numbered from zero.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice `all` (already sorted) into the requested page.
    pub fn slice(all: Vec<T>, page_number: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = all.len().div_ceil(page_size);
        let items = all
            .into_iter()
            .skip(page_number.saturating_mul(page_size))
            .take(page_size)
            .collect();
        Self {
            items,
            page_number,
            page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slice() {
        let page = Page::slice((0..25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page_size, 10);

        let past_end = Page::slice((0..5).collect::<Vec<_>>(), 4, 10);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 1);

        let empty = Page::slice(Vec::<i32>::new(), 0, 10);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(
            serde_json::to_string(&MemberRole::User).unwrap(),
            "\"ROLE_USER\""
        );
        assert_eq!(MemberRole::Admin.as_str(), "ROLE_ADMIN");
    }
}
