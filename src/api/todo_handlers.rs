//! Todo list handlers
//!
//! Endpoints (all authenticated):
//! - `GET    /api/todo/fetch`
//! - `POST   /api/todo/save`
//! - `PATCH  /api/todo/updateTitle`
//! - `PATCH  /api/todo/updateCompleted`
//! - `DELETE /api/todo/delete/{id}`

use crate::api::handlers::{ApiJson, ApiPath, ApiResponse, AppError, BoardState};
use crate::api::validation::Validator;
use crate::auth::AuthUser;
use crate::store::Todo;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Request body for POST /api/todo/save
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaveTodoRequest {
    pub title: String,
}

/// Request body for PATCH /api/todo/updateTitle
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTitleRequest {
    pub id: i64,
    pub title: String,
}

/// Request body for PATCH /api/todo/updateCompleted
#[derive(Debug, Deserialize)]
pub struct UpdateCompletedRequest {
    #[serde(default)]
    pub id: i64,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct TodoDto {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

impl From<Todo> for TodoDto {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            completed: todo.completed,
        }
    }
}

fn not_found(state: &BoardState, id: i64) -> AppError {
    AppError::NotFound(format!("{} id: {}", state.messages.get("common.notFound"), id))
}

/// GET /api/todo/fetch
pub async fn fetch_todos(State(state): State<BoardState>, _user: AuthUser) -> ApiResponse<Vec<TodoDto>> {
    let todos = state.board.list_todos().await?;
    Ok(state.ok(todos.into_iter().map(TodoDto::from).collect()))
}

/// POST /api/todo/save
pub async fn save_todo(
    State(state): State<BoardState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<SaveTodoRequest>,
) -> ApiResponse<TodoDto> {
    Validator::new(&state.messages).not_blank("title", &req.title)?;
    let todo = state.board.create_todo(&req.title).await?;
    Ok(state.ok(todo.into()))
}

/// PATCH /api/todo/updateTitle
pub async fn update_title(
    State(state): State<BoardState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<UpdateTitleRequest>,
) -> ApiResponse<TodoDto> {
    let v = Validator::new(&state.messages);
    v.positive("id", req.id)?;
    v.not_blank("title", &req.title)?;

    let todo = state
        .board
        .update_todo_title(req.id, &req.title)
        .await?
        .ok_or_else(|| not_found(&state, req.id))?;
    Ok(state.ok(todo.into()))
}

/// PATCH /api/todo/updateCompleted
pub async fn update_completed(
    State(state): State<BoardState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<UpdateCompletedRequest>,
) -> ApiResponse<TodoDto> {
    Validator::new(&state.messages).positive("id", req.id)?;

    let todo = state
        .board
        .update_todo_completed(req.id, req.completed)
        .await?
        .ok_or_else(|| not_found(&state, req.id))?;
    Ok(state.ok(todo.into()))
}

/// DELETE /api/todo/delete/{id} — contents is the deleted id.
pub async fn delete_todo(
    State(state): State<BoardState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<i64> {
    Validator::new(&state.messages).positive("id", id)?;

    if !state.board.delete_todo(id).await? {
        return Err(not_found(&state, id));
    }
    Ok(state.ok(id))
}
