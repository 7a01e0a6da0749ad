//! HTTP API for the board server

pub mod auth_handlers;
pub mod comment_handlers;
pub mod handlers;
pub mod post_handlers;
pub mod query;
pub mod routes;
pub mod todo_handlers;
pub mod validation;

pub use handlers::{AppError, BoardState, ServerState};
pub use routes::{cors_layer, create_router};
