//! Shared HTTP state, the response envelope and the error boundary

use crate::auth::{IdentityResolver, RevocationStore, TokenCodec};
use crate::messages::Messages;
use crate::store::{BoardStore, MemberStore};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Shared server state
pub struct ServerState {
    pub members: Arc<dyn MemberStore>,
    pub board: Arc<dyn BoardStore>,
    pub tokens: Arc<TokenCodec>,
    pub revocations: Arc<dyn RevocationStore>,
    pub identity: IdentityResolver,
    pub messages: Arc<Messages>,
}

/// Shared board state
pub type BoardState = Arc<ServerState>;

// ============================================================================
// Response envelope
// ============================================================================

/// Uniform body for every JSON response, success or failure.
#[derive(Debug, Serialize)]
pub struct ApiResult<T> {
    pub result: bool,
    pub message: String,
    pub contents: Option<T>,
}

impl<T: Serialize> ApiResult<T> {
    pub fn success(message: impl Into<String>, contents: T) -> Json<Self> {
        Json(Self {
            result: true,
            message: message.into(),
            contents: Some(contents),
        })
    }
}

impl ApiResult<()> {
    /// Success with `"contents": null`.
    pub fn empty(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            result: true,
            message: message.into(),
            contents: None,
        })
    }

    pub fn failure(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            result: false,
            message: message.into(),
            contents: None,
        })
    }
}

impl ServerState {
    /// Envelope `contents` with the `common.success` message.
    pub fn ok<T: Serialize>(&self, contents: T) -> Json<ApiResult<T>> {
        ApiResult::success(self.messages.get("common.success"), contents)
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness endpoint. The in-memory stores have no remote dependency to check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Extractors whose rejections use the envelope
// ============================================================================

/// `Json` body that rejects with a 400 envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` string that rejects with a 400 envelope.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `Path` params that reject with a 400 envelope.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

// ============================================================================
// Error handling
// ============================================================================

/// API error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                // Full detail stays in the server log.
                error!(error = ?e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        debug!(status = status.as_u16(), message = %message, "Request failed");

        (status, ApiResult::failure(message)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

/// Handler return type
pub type ApiResponse<T> = Result<Json<ApiResult<T>>, AppError>;
