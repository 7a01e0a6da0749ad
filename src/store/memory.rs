//! In-memory implementation of the member and board stores.
//!
//! Every collection is a `tokio::sync::RwLock<HashMap<K, V>>`. When an
//! operation needs more than one lock it always takes them in field order
//! (members, posts, likes, comments, todos).

use crate::store::models::*;
use crate::store::traits::{BoardStore, MemberStore, StoreError};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// Process-local store. Ids are assigned from a single sequence starting at 1.
pub struct MemoryStore {
    pub members: RwLock<HashMap<i64, Member>>,
    pub posts: RwLock<HashMap<i64, Post>>,
    /// (post_id, member_id)
    pub likes: RwLock<HashSet<(i64, i64)>>,
    pub comments: RwLock<HashMap<i64, PostComment>>,
    pub todos: RwLock<HashMap<i64, Todo>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
            posts: RwLock::new(HashMap::new()),
            likes: RwLock::new(HashSet::new()),
            comments: RwLock::new(HashMap::new()),
            todos: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    posts
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        Ok(self
            .members
            .read()
            .await
            .values()
            .find(|m| m.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Member>> {
        Ok(self.members.read().await.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.members.read().await.values().any(|m| m.email == email))
    }

    async fn insert(&self, member: NewMember) -> Result<Member> {
        let mut members = self.members.write().await;
        if members.values().any(|m| m.email == member.email) {
            return Err(StoreError::DuplicateEmail(member.email).into());
        }
        let now = Utc::now();
        let member = Member {
            id: self.next_id(),
            email: member.email,
            password_hash: member.password_hash,
            roles: member.roles,
            created_at: now,
            updated_at: now,
        };
        members.insert(member.id, member.clone());
        Ok(member)
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn create_post(&self, member_id: i64, title: &str, content: &str) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: self.next_id(),
            title: title.to_string(),
            content: content.to_string(),
            member_id,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.posts.write().await.insert(post.id, post.clone());
        Ok(post)
    }

    async fn list_posts(&self, page_number: usize, page_size: usize) -> Result<Page<Post>> {
        let all: Vec<Post> = self.posts.read().await.values().cloned().collect();
        Ok(Page::slice(newest_first(all), page_number, page_size))
    }

    async fn search_posts(
        &self,
        title: &str,
        page_number: usize,
        page_size: usize,
    ) -> Result<Page<Post>> {
        let needle = title.to_lowercase();
        let matches: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(Page::slice(newest_first(matches), page_number, page_size))
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn update_post(&self, id: i64, title: &str, content: &str) -> Result<Option<Post>> {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(&id).map(|post| {
            post.title = title.to_string();
            post.content = content.to_string();
            post.updated_at = Utc::now();
            post.clone()
        }))
    }

    async fn delete_post(&self, id: i64) -> Result<Option<usize>> {
        let mut posts = self.posts.write().await;
        let mut likes = self.likes.write().await;
        let mut comments = self.comments.write().await;
        if posts.remove(&id).is_none() {
            return Ok(None);
        }
        likes.retain(|(post_id, _)| *post_id != id);
        let before = comments.len();
        comments.retain(|_, c| c.post_id != id);
        Ok(Some(before - comments.len()))
    }

    async fn toggle_like(&self, post_id: i64, member_id: i64) -> Result<Option<(Post, bool)>> {
        let mut posts = self.posts.write().await;
        let mut likes = self.likes.write().await;
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(None);
        };
        let liked = if likes.remove(&(post_id, member_id)) {
            post.like_count = post.like_count.saturating_sub(1);
            false
        } else {
            likes.insert((post_id, member_id));
            post.like_count += 1;
            true
        };
        Ok(Some((post.clone(), liked)))
    }

    async fn is_liked(&self, post_id: i64, member_id: i64) -> Result<bool> {
        Ok(self.likes.read().await.contains(&(post_id, member_id)))
    }

    async fn create_comment(
        &self,
        post_id: i64,
        member: &Member,
        content: &str,
    ) -> Result<Option<PostComment>> {
        // Held until the comment is stored so a concurrent delete_post waits.
        let posts = self.posts.read().await;
        if !posts.contains_key(&post_id) {
            return Ok(None);
        }
        let now = Utc::now();
        let comment = PostComment {
            id: self.next_id(),
            post_id,
            member_id: member.id,
            member_email: member.email.clone(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.comments
            .write()
            .await
            .insert(comment.id, comment.clone());
        Ok(Some(comment))
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<PostComment>> {
        let mut comments: Vec<PostComment> = self
            .comments
            .read()
            .await
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<PostComment>> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        Ok(self.comments.write().await.remove(&id).is_some())
    }

    async fn list_todos(&self) -> Result<Vec<Todo>> {
        let mut todos: Vec<Todo> = self.todos.read().await.values().cloned().collect();
        todos.sort_by_key(|t| t.id);
        Ok(todos)
    }

    async fn create_todo(&self, title: &str) -> Result<Todo> {
        let todo = Todo {
            id: self.next_id(),
            title: title.to_string(),
            completed: false,
        };
        self.todos.write().await.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn update_todo_title(&self, id: i64, title: &str) -> Result<Option<Todo>> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(&id).map(|todo| {
            todo.title = title.to_string();
            todo.clone()
        }))
    }

    async fn update_todo_completed(&self, id: i64, completed: bool) -> Result<Option<Todo>> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(&id).map(|todo| {
            todo.completed = completed;
            todo.clone()
        }))
    }

    async fn delete_todo(&self, id: i64) -> Result<bool> {
        Ok(self.todos.write().await.remove(&id).is_some())
    }
}
