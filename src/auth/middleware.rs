//! Auth middleware for Axum routes.
//!
//! Resolves the Bearer token on each request into an [`AuthUser`] stored in
//! the request extensions. A request without a usable token passes through
//! anonymously; whether a route needs identity is decided by its handler
//! taking `AuthUser` or `Option<AuthUser>`.

use crate::api::handlers::{AppError, BoardState};
use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{extract_bearer, fingerprint};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};

/// Routes that never look at the Authorization header.
const BYPASS: &[(&str, &str)] = &[
    ("POST", "/auth/signIn"),
    ("POST", "/auth/signUp"),
    ("GET", "/auth/signOut"),
    ("GET", "/health"),
];

fn is_bypassed(method: &Method, path: &str) -> bool {
    BYPASS
        .iter()
        .any(|(m, p)| *m == method.as_str() && *p == path)
}

/// Middleware that resolves a Bearer token into request identity.
///
/// # Behavior
/// 1. Bypassed routes → passed straight through
/// 2. No `Authorization: Bearer <token>` header → passed through anonymously
/// 3. Revoked token → 401
/// 4. Token fails verification → 401
/// 5. Subject has no member → 404
/// 6. Inject `AuthUser` into request extensions for downstream handlers
///
/// A store failure while resolving the member is logged and answered with
/// 401, never with access.
pub async fn authenticate(
    State(state): State<BoardState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Allow-listed routes
    if is_bypassed(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    // 2. Extract Bearer token
    let token = match req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
    {
        Some(token) => token.to_string(),
        None => return Ok(next.run(req).await),
    };

    // 3. Revocation
    if state.revocations.is_revoked(&token) {
        warn!(token = fingerprint(&token), "Rejected revoked token");
        return Err(AppError::Unauthorized("token is blacklisted".to_string()));
    }

    // 4. Signature and expiry
    let claims = state.tokens.verify(&token).map_err(|e| {
        debug!(token = fingerprint(&token), error = %e, "Token verification failed");
        AppError::Unauthorized("invalid or expired token".to_string())
    })?;

    // 5. Identity
    let member = match state.identity.lookup(&claims.sub).await {
        Ok(Some(member)) => member,
        Ok(None) => {
            warn!(subject = %claims.sub, "Valid token for unknown member");
            return Err(AppError::NotFound("user not found".to_string()));
        }
        Err(e) => {
            error!(subject = %claims.sub, error = ?e, "Identity lookup failed");
            return Err(AppError::Unauthorized("authentication error".to_string()));
        }
    };

    // 6. Publish identity for this request only
    req.extensions_mut().insert(AuthUser::from(&member));

    Ok(next.run(req).await)
}

// ============================================================================
// Tests
// ============================================================================
