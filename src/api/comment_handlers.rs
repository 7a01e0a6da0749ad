//! Post comment handlers
//!
//! Endpoints:
//! - `GET    /api/postComment?postId=N` — Comments on a post, oldest first
//! - `POST   /api/postComment`          — Add a comment
//! - `DELETE /api/postComment/{id}`     — Remove own comment (204)

use crate::api::handlers::{ApiJson, ApiPath, ApiQuery, ApiResponse, AppError, BoardState};
use crate::api::query::CommentQuery;
use crate::api::validation::Validator;
use crate::auth::AuthUser;
use crate::store::PostComment;
use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Request body for POST /api/postComment
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCommentDto {
    pub id: i64,
    pub content: String,
    pub member_id: i64,
    pub member_email: String,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Whether the caller wrote this comment and may delete it
    pub is_enabled_delete: bool,
}

impl PostCommentDto {
    fn for_viewer(comment: PostComment, viewer: &AuthUser) -> Self {
        Self {
            is_enabled_delete: comment.member_id == viewer.member_id,
            id: comment.id,
            content: comment.content,
            member_id: comment.member_id,
            member_email: comment.member_email,
            post_id: comment.post_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

fn not_found(state: &BoardState, id: i64) -> AppError {
    AppError::NotFound(format!("{} id: {}", state.messages.get("common.notFound"), id))
}

/// GET /api/postComment?postId=N
pub async fn list_comments(
    State(state): State<BoardState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<CommentQuery>,
) -> ApiResponse<Vec<PostCommentDto>> {
    Validator::new(&state.messages).positive("postId", query.post_id)?;

    let comments = state
        .board
        .list_comments(query.post_id)
        .await?
        .into_iter()
        .map(|c| PostCommentDto::for_viewer(c, &user))
        .collect();
    Ok(state.ok(comments))
}

/// POST /api/postComment
pub async fn create_comment(
    State(state): State<BoardState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> ApiResponse<PostCommentDto> {
    let v = Validator::new(&state.messages);
    v.positive("postId", req.post_id)?;
    v.not_blank("content", &req.content)?;

    let member = state
        .members
        .find_by_id(user.member_id)
        .await?
        .ok_or_else(|| not_found(&state, user.member_id))?;

    let comment = state
        .board
        .create_comment(req.post_id, &member, &req.content)
        .await?
        .ok_or_else(|| not_found(&state, req.post_id))?;
    info!(comment_id = comment.id, post_id = req.post_id, "Created comment");

    Ok(state.ok(PostCommentDto::for_viewer(comment, &user)))
}

/// DELETE /api/postComment/{id}
pub async fn delete_comment(
    State(state): State<BoardState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    Validator::new(&state.messages).positive("id", id)?;

    let comment = state
        .board
        .get_comment(id)
        .await?
        .ok_or_else(|| not_found(&state, id))?;
    if comment.member_id != user.member_id {
        return Err(AppError::Forbidden(
            state.messages.get("common.forbidden").to_string(),
        ));
    }

    state.board.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
