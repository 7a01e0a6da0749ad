//! API route definitions

use super::handlers::{self, BoardState};
use super::{auth_handlers, comment_handlers, post_handlers, todo_handlers};
use crate::auth::middleware::authenticate;
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Origins allowed when none are configured
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:8080"];

/// Build the CORS policy for `origins`. Fails on an origin that is not a
/// valid header value.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o.trim_end_matches('/'))
                .with_context(|| format!("invalid CORS origin: {}", o))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([header::AUTHORIZATION, header::CACHE_CONTROL, header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Create the API router
pub fn create_router(state: BoardState, cors: CorsLayer) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Auth
        // ====================================================================
        .route("/auth/signIn", post(auth_handlers::sign_in))
        .route("/auth/signUp", post(auth_handlers::sign_up))
        .route("/auth/signOut", get(auth_handlers::sign_out))
        // ====================================================================
        // Posts
        // ====================================================================
        .route(
            "/api/post",
            get(post_handlers::list_posts).post(post_handlers::create_post),
        )
        .route("/api/post/search", get(post_handlers::search_posts))
        .route(
            "/api/post/{id}",
            get(post_handlers::get_post)
                .put(post_handlers::update_post)
                .delete(post_handlers::delete_post),
        )
        .route("/api/post/{id}/like", post(post_handlers::toggle_like))
        // Comments
        .route(
            "/api/postComment",
            get(comment_handlers::list_comments).post(comment_handlers::create_comment),
        )
        .route(
            "/api/postComment/{id}",
            delete(comment_handlers::delete_comment),
        )
        // ====================================================================
        // Todos
        // ====================================================================
        .route("/api/todo/fetch", get(todo_handlers::fetch_todos))
        .route("/api/todo/save", post(todo_handlers::save_todo))
        .route("/api/todo/updateTitle", patch(todo_handlers::update_title))
        .route(
            "/api/todo/updateCompleted",
            patch(todo_handlers::update_completed),
        )
        .route("/api/todo/delete/{id}", delete(todo_handlers::delete_todo))
        // Token resolution runs inside CORS so preflights never need a token.
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
