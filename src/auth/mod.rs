//! Authentication module — stateless JWT with revocation
//!
//! Provides:
//! - Token issuing and verification (`jwt` submodule)
//! - Early invalidation of tokens on sign-out (`blacklist` submodule)
//! - Per-request token resolution (`middleware`) and the `AuthUser` extractor
//! - Credential checks and sign-up against the member store (`identity`)

pub mod blacklist;
pub mod extractor;
pub mod identity;
pub mod jwt;
pub mod middleware;

pub use blacklist::{MemoryRevocationStore, RevocationStore};
pub use extractor::AuthUser;
pub use identity::{IdentityError, IdentityResolver};
pub use jwt::{Claims, SigningKey, TokenCodec, TokenError};
