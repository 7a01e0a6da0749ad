//! Authentication route handlers — sign-in, sign-up, sign-out.
//!
//! Endpoints:
//! - `POST /auth/signIn`  — Email/password login, returns a JWT
//! - `POST /auth/signUp`  — Create an account with the default role
//! - `GET  /auth/signOut` — Revoke the presented token before it expires
//!
//! All three bypass the auth middleware; sign-out validates its token itself.

use crate::api::handlers::{ApiJson, ApiResponse, ApiResult, AppError, BoardState};
use crate::api::validation::Validator;
use crate::auth::identity::IdentityError;
use crate::auth::jwt::{extract_bearer, fingerprint};
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request / Response types
// ============================================================================

/// Request body for POST /auth/signIn and POST /auth/signUp
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Contents of a successful sign-in
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Contents of a successful sign-up
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub id: i64,
    pub email: String,
}

fn validate_credentials(state: &BoardState, req: &CredentialsRequest) -> Result<(), AppError> {
    let v = Validator::new(&state.messages);
    v.email(&req.email)?;
    v.password(&req.password)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signIn — Email/password authentication.
///
/// Security: the failure message never reveals whether the email exists.
pub async fn sign_in(
    State(state): State<BoardState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> ApiResponse<TokenResponse> {
    validate_credentials(&state, &req)?;

    let member = state
        .identity
        .authenticate(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            IdentityError::BadCredentials => AppError::Unauthorized(
                state.messages.get("user.email.password.incorrect").to_string(),
            ),
            IdentityError::EmailTaken(_) | IdentityError::Store(_) => {
                AppError::Internal(anyhow::Error::new(e))
            }
        })?;

    let token = state
        .tokens
        .issue(&member.email)
        .map_err(|e| AppError::Internal(e.into()))?;

    info!(member_id = member.id, token = fingerprint(&token), "Signed in");
    Ok(state.ok(TokenResponse { token }))
}

/// POST /auth/signUp — Register a new account with role `ROLE_USER`.
pub async fn sign_up(
    State(state): State<BoardState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<ApiResult<SignUpResponse>>), AppError> {
    validate_credentials(&state, &req)?;

    let member = state
        .identity
        .register(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            IdentityError::EmailTaken(_) => {
                AppError::Conflict(state.messages.get("user.email.exists").to_string())
            }
            IdentityError::Store(e) => AppError::Internal(e),
            IdentityError::BadCredentials => AppError::Internal(anyhow::Error::new(e)),
        })?;

    Ok((
        StatusCode::CREATED,
        state.ok(SignUpResponse {
            id: member.id,
            email: member.email,
        }),
    ))
}

/// GET /auth/signOut — Revoke the Bearer token.
///
/// The token must be present, not yet revoked and currently valid. The
/// revocation remembers the token's expiry so it can be swept afterwards.
pub async fn sign_out(
    State(state): State<BoardState>,
    headers: HeaderMap,
) -> ApiResponse<()> {
    let invalid = || AppError::Unauthorized(state.messages.get("auth.token.invalid").to_string());

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
        .ok_or_else(invalid)?;

    if state.revocations.is_revoked(token) {
        warn!(token = fingerprint(token), "Sign-out with revoked token");
        return Err(AppError::Unauthorized("token is blacklisted".to_string()));
    }

    let claims = state.tokens.verify(token).map_err(|e| {
        warn!(token = fingerprint(token), error = %e, "Sign-out with invalid token");
        invalid()
    })?;

    state.revocations.revoke_until(token, claims.expires_at());
    info!(subject = %claims.sub, token = fingerprint(token), "Signed out");

    Ok(ApiResult::empty(state.messages.get("auth.logout.success")))
}

// ============================================================================
// Tests
// ============================================================================
