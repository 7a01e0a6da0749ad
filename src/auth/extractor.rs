//! AuthUser extractor for Axum handlers.
//!
//! Reads the identity the `authenticate` middleware published in the request
//! extensions. Taking `AuthUser` makes a handler require authentication;
//! taking `Option<AuthUser>` admits anonymous callers.

use crate::api::handlers::{AppError, BoardState};
use crate::store::{Member, MemberRole};
use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use std::convert::Infallible;

/// Authenticated identity for the current request.
///
/// ```rust,ignore
/// async fn my_handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub member_id: i64,
    pub email: String,
    pub roles: Vec<MemberRole>,
}

impl AuthUser {
    pub fn has_role(&self, role: MemberRole) -> bool {
        self.roles.contains(&role)
    }
}

impl From<&Member> for AuthUser {
    fn from(member: &Member) -> Self {
        Self {
            member_id: member.id,
            email: member.email.clone(),
            roles: member.roles.clone(),
        }
    }
}

impl FromRequestParts<BoardState> for AuthUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &BoardState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user = parts.extensions.get::<AuthUser>().cloned();
        let rejection = state.messages.get("common.unauthenticated").to_string();
        async move { user.ok_or(AppError::Unauthorized(rejection)) }
    }
}

impl OptionalFromRequestParts<BoardState> for AuthUser {
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &BoardState,
    ) -> impl std::future::Future<Output = Result<Option<Self>, Self::Rejection>> + Send {
        let user = parts.extensions.get::<AuthUser>().cloned();
        async move { Ok(user) }
    }
}

// ============================================================================
// Tests
// ============================================================================
