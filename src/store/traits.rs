//! Store trait definitions
//!
//! The HTTP layer and the auth pipeline only see these traits, so the
//! in-memory backend can be swapped for a relational one without touching
//! callers.

use crate::store::models::*;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Typed store failures that callers branch on. Everything else is an
/// opaque `anyhow::Error`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
}

/// Identity store backing token subjects.
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Member>>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// Insert a member. Fails with [`StoreError::DuplicateEmail`] if the email
    /// is taken, atomically with respect to concurrent inserts.
    async fn insert(&self, member: NewMember) -> Result<Member>;
}

/// Posts, comments, likes and todos.
#[async_trait]
pub trait BoardStore: Send + Sync {
    // ========================================================================
    // Posts
    // ========================================================================

    async fn create_post(&self, member_id: i64, title: &str, content: &str) -> Result<Post>;

    /// Newest first.
    async fn list_posts(&self, page_number: usize, page_size: usize) -> Result<Page<Post>>;

    /// Case-insensitive title substring match, newest first.
    async fn search_posts(
        &self,
        title: &str,
        page_number: usize,
        page_size: usize,
    ) -> Result<Page<Post>>;

    async fn get_post(&self, id: i64) -> Result<Option<Post>>;

    async fn update_post(&self, id: i64, title: &str, content: &str) -> Result<Option<Post>>;

    /// Delete a post together with its likes and comments. Returns the number
    /// of comments removed, or `None` if the post did not exist.
    async fn delete_post(&self, id: i64) -> Result<Option<usize>>;

    /// Flip `member_id`'s like on a post and adjust its like count in one step.
    /// Returns the updated post and whether the member now likes it.
    async fn toggle_like(&self, post_id: i64, member_id: i64) -> Result<Option<(Post, bool)>>;

    async fn is_liked(&self, post_id: i64, member_id: i64) -> Result<bool>;

    // ========================================================================
    // Comments
    // ========================================================================

    /// Returns `None` if the post does not exist. Never leaves a comment on a
    /// post deleted concurrently.
    async fn create_comment(
        &self,
        post_id: i64,
        member: &Member,
        content: &str,
    ) -> Result<Option<PostComment>>;

    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<PostComment>>;

    async fn get_comment(&self, id: i64) -> Result<Option<PostComment>>;

    async fn delete_comment(&self, id: i64) -> Result<bool>;

    // ========================================================================
    // Todos
    // ========================================================================

    async fn list_todos(&self) -> Result<Vec<Todo>>;

    async fn create_todo(&self, title: &str) -> Result<Todo>;

    async fn update_todo_title(&self, id: i64, title: &str) -> Result<Option<Todo>>;

    async fn update_todo_completed(&self, id: i64, completed: bool) -> Result<Option<Todo>>;

    async fn delete_todo(&self, id: i64) -> Result<bool>;
}
