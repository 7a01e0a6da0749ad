//! Test helper factories and state builders
//!
//! Builds a fully in-memory server state with a fixed signing secret and a
//! low bcrypt cost, plus small helpers for driving the router.
#![allow(dead_code)]

use crate::api::{create_router, cors_layer, BoardState, ServerState};
use crate::auth::IdentityResolver;
use crate::build_state;
use crate::messages::Locale;
use crate::store::{Member, MemberStore, NewMember};
use crate::Config;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";
pub const TEST_PASSWORD: &str = "abcd1234";

pub fn test_config() -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration_millis: 3_600_000,
        bcrypt_cost: 4,
        revocation_sweep_secs: 60,
        locale: Locale::En,
    }
}

// ============================================================================
// State builders
// ============================================================================

/// In-memory state with a one hour token TTL
pub fn test_state() -> BoardState {
    test_state_with_ttl(3_600_000)
}

pub fn test_state_with_ttl(ttl_millis: u64) -> BoardState {
    let mut config = test_config();
    config.jwt_expiration_millis = ttl_millis;
    build_state(&config).expect("test state")
}

/// In-memory state whose identity lookups go to `members` instead.
pub fn test_state_with_members(members: Arc<dyn MemberStore>) -> BoardState {
    let base = test_state();
    Arc::new(ServerState {
        members: members.clone(),
        board: base.board.clone(),
        tokens: base.tokens.clone(),
        revocations: base.revocations.clone(),
        identity: IdentityResolver::new(members, test_config().bcrypt_cost),
        messages: base.messages.clone(),
    })
}

pub fn test_router(state: BoardState) -> Router {
    let cors = cors_layer(&test_config().cors_origins).expect("test cors");
    create_router(state, cors)
}

/// Register `email` with [`TEST_PASSWORD`] and issue it a token.
pub async fn seed_member(state: &BoardState, email: &str) -> (Member, String) {
    let member = state
        .identity
        .register(email, TEST_PASSWORD)
        .await
        .expect("register member");
    let token = state.tokens.issue(email).expect("issue token");
    (member, token)
}

// ============================================================================
// Store doubles
// ============================================================================

/// Member store that fails every call, as an unreachable database would.
pub struct UnavailableMemberStore;

#[async_trait]
impl MemberStore for UnavailableMemberStore {
    async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<Member>> {
        anyhow::bail!("member store unavailable")
    }

    async fn find_by_id(&self, _id: i64) -> anyhow::Result<Option<Member>> {
        anyhow::bail!("member store unavailable")
    }

    async fn exists_by_email(&self, _email: &str) -> anyhow::Result<bool> {
        anyhow::bail!("member store unavailable")
    }

    async fn insert(&self, _member: NewMember) -> anyhow::Result<Member> {
        anyhow::bail!("member store unavailable")
    }
}

// ============================================================================
// Request helpers
// ============================================================================

/// Send one request through `app`, with an optional Bearer token and JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("infallible")
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
