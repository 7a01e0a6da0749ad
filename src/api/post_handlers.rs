//! Board post handlers
//!
//! Endpoints:
//! - `POST   /api/post`             — Create a post
//! - `GET    /api/post`             — Page through posts (public)
//! - `GET    /api/post/search`      — Title search
//! - `GET    /api/post/{id}`        — Single post
//! - `PUT    /api/post/{id}`        — Edit (author only)
//! - `DELETE /api/post/{id}`        — Delete with comments and likes (author only)
//! - `POST   /api/post/{id}/like`   — Toggle the caller's like

use crate::api::handlers::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AppError, BoardState};
use crate::api::query::{PageQuery, SearchQuery, PAGE_SIZE};
use crate::api::validation::Validator;
use crate::auth::AuthUser;
use crate::store::{Page, Post};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request / Response types
// ============================================================================

/// Request body for POST /api/post and PUT /api/post/{id}
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub like_count: u32,
    pub liked_by_user: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostDto {
    fn new(post: Post, liked_by_user: bool) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            like_count: post.like_count,
            liked_by_user,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// One page of posts
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPageDto {
    pub posts: Vec<PostDto>,
    pub total_pages: usize,
    pub size_pages: usize,
    pub current_page_number: usize,
}

// ============================================================================
// Helpers
// ============================================================================

async fn to_dto(state: &BoardState, post: Post, user: Option<&AuthUser>) -> Result<PostDto, AppError> {
    let liked = match user {
        Some(user) => state.board.is_liked(post.id, user.member_id).await?,
        None => false,
    };
    Ok(PostDto::new(post, liked))
}

async fn to_page_dto(
    state: &BoardState,
    page: Page<Post>,
    user: Option<&AuthUser>,
) -> Result<PostPageDto, AppError> {
    let mut posts = Vec::with_capacity(page.items.len());
    for post in page.items {
        posts.push(to_dto(state, post, user).await?);
    }
    Ok(PostPageDto {
        posts,
        total_pages: page.total_pages,
        size_pages: page.page_size,
        current_page_number: page.page_number,
    })
}

/// Fetch a post by a validated id, or 404.
async fn load_post(state: &BoardState, id: i64) -> Result<Post, AppError> {
    Validator::new(&state.messages).positive("id", id)?;
    state
        .board
        .get_post(id)
        .await?
        .ok_or_else(|| not_found(state, id))
}

fn not_found(state: &BoardState, id: i64) -> AppError {
    AppError::NotFound(format!("{} id: {}", state.messages.get("common.notFound"), id))
}

fn require_author(state: &BoardState, post: &Post, user: &AuthUser) -> Result<(), AppError> {
    if post.member_id == user.member_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            state.messages.get("common.forbidden").to_string(),
        ))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/post
pub async fn create_post(
    State(state): State<BoardState>,
    user: AuthUser,
    ApiJson(req): ApiJson<PostRequest>,
) -> Result<(StatusCode, Json<ApiResult<PostDto>>), AppError> {
    let v = Validator::new(&state.messages);
    v.not_blank("title", &req.title)?;
    v.not_blank("content", &req.content)?;

    let post = state
        .board
        .create_post(user.member_id, &req.title, &req.content)
        .await?;
    info!(post_id = post.id, member_id = user.member_id, "Created post");

    Ok((StatusCode::CREATED, state.ok(PostDto::new(post, false))))
}

/// GET /api/post?pageNumber=N — open to anonymous callers.
pub async fn list_posts(
    State(state): State<BoardState>,
    user: Option<AuthUser>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResponse<PostPageDto> {
    let page = state.board.list_posts(query.page_number, PAGE_SIZE).await?;
    let dto = to_page_dto(&state, page, user.as_ref()).await?;
    Ok(state.ok(dto))
}

/// GET /api/post/search?title=T&pageNumber=N
pub async fn search_posts(
    State(state): State<BoardState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResponse<PostPageDto> {
    Validator::new(&state.messages).not_blank("title", &query.title)?;

    let page = state
        .board
        .search_posts(&query.title, query.page_number, PAGE_SIZE)
        .await?;
    let dto = to_page_dto(&state, page, Some(&user)).await?;
    Ok(state.ok(dto))
}

/// GET /api/post/{id}
pub async fn get_post(
    State(state): State<BoardState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<PostDto> {
    let post = load_post(&state, id).await?;
    let dto = to_dto(&state, post, Some(&user)).await?;
    Ok(state.ok(dto))
}

/// PUT /api/post/{id}
pub async fn update_post(
    State(state): State<BoardState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<PostRequest>,
) -> ApiResponse<PostDto> {
    let v = Validator::new(&state.messages);
    v.not_blank("title", &req.title)?;
    v.not_blank("content", &req.content)?;

    let post = load_post(&state, id).await?;
    require_author(&state, &post, &user)?;

    let post = state
        .board
        .update_post(id, &req.title, &req.content)
        .await?
        .ok_or_else(|| not_found(&state, id))?;
    let dto = to_dto(&state, post, Some(&user)).await?;
    Ok(state.ok(dto))
}

/// DELETE /api/post/{id} — contents is the deleted id.
pub async fn delete_post(
    State(state): State<BoardState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<i64> {
    let post = load_post(&state, id).await?;
    require_author(&state, &post, &user)?;

    let comments = state
        .board
        .delete_post(id)
        .await?
        .ok_or_else(|| not_found(&state, id))?;
    info!(post_id = id, comments, "Deleted post");

    Ok(state.ok(id))
}

/// POST /api/post/{id}/like
pub async fn toggle_like(
    State(state): State<BoardState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<PostDto> {
    Validator::new(&state.messages).positive("id", id)?;

    let (post, liked) = state
        .board
        .toggle_like(id, user.member_id)
        .await?
        .ok_or_else(|| not_found(&state, id))?;
    Ok(state.ok(PostDto::new(post, liked)))
}

// ============================================================================
// Tests
// ============================================================================
