//! JWT token issuance and verification using HS256.
//!
//! Tokens carry the member's email as subject and are sent back by clients
//! in the `Authorization: Bearer <token>` header. Verification is stateless;
//! revocation before natural expiry is layered on top by
//! [`RevocationStore`](crate::auth::blacklist::RevocationStore).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Minimum length of the HMAC signing secret, in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// Minimum token lifetime. Claims carry second-precision timestamps.
pub const MIN_TTL_MILLIS: u64 = 1000;

/// Maximum token lifetime (one year).
pub const MAX_TTL_MILLIS: u64 = 365 * 24 * 60 * 60 * 1000;

const BEARER_PREFIX: &str = "Bearer ";

/// Errors produced while issuing or verifying a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("blank subject or expiry out of range")]
    InvalidInput,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
}

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject — member email
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Token id, unique per issuance
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.saturating_mul(1000) <= now.timestamp_millis()
    }
}

/// Process-wide HMAC secret. Construction enforces the minimum length, so a
/// `SigningKey` that exists is always usable.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        if secret.len() < MIN_SECRET_BYTES {
            anyhow::bail!(
                "JWT secret must be at least {} bytes (got {})",
                MIN_SECRET_BYTES,
                secret.len()
            );
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Encodes, signs and verifies tokens. Immutable after construction and
/// shared between request tasks behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: SigningKey,
    ttl: Duration,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(key: SigningKey, ttl_millis: u64) -> anyhow::Result<Self> {
        if !(MIN_TTL_MILLIS..=MAX_TTL_MILLIS).contains(&ttl_millis) {
            anyhow::bail!(
                "JWT expiration must be between {} and {} ms (got {})",
                MIN_TTL_MILLIS,
                MAX_TTL_MILLIS,
                ttl_millis
            );
        }
        let ttl_millis = i64::try_from(ttl_millis)
            .map_err(|_| anyhow::anyhow!("JWT expiration {} ms is out of range", ttl_millis))?;

        // Expiry is checked by hand so it can be evaluated before the MAC and
        // without jsonwebtoken's default leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            key,
            ttl: Duration::milliseconds(ttl_millis),
            validation,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject`, valid from now for the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub(crate) fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        if subject.trim().is_empty() {
            return Err(TokenError::InvalidInput);
        }

        // Round up to whole seconds so the lifetime is never shorter than the TTL.
        let exp = now
            .timestamp_millis()
            .checked_add(self.ttl.num_milliseconds())
            .and_then(|ms| ms.checked_add(999))
            .map(|ms| ms.div_euclid(1000))
            .filter(|secs| Utc.timestamp_opt(*secs, 0).single().is_some())
            .ok_or(TokenError::InvalidInput)?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        // HS256 signing over serializable claims cannot fail.
        encode(&Header::default(), &claims, &self.key.encoding).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode JWT");
            TokenError::Malformed
        })
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let unverified = peek_claims(token)?;
        if unverified.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        let data = decode::<Claims>(token, &self.key.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }
        Ok(data.claims)
    }

    /// Verify a token and return only its subject.
    pub fn subject(&self, token: &str) -> Result<String, TokenError> {
        self.verify(token).map(|claims| claims.sub)
    }

    /// True unless the token fully verifies. Unparseable or forged tokens
    /// count as expired.
    pub fn is_expired(&self, token: &str) -> bool {
        self.is_expired_at(token, Utc::now())
    }

    pub(crate) fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.verify_at(token, now).is_err()
    }
}

/// Decode the claims segment without checking the signature.
fn peek_claims(token: &str) -> Result<Claims, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(TokenError::Malformed);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

/// Extract the token from an `Authorization` header value.
///
/// Returns `None` unless the value starts with `"Bearer "` followed by a
/// non-blank token.
pub fn extract_bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Short, log-safe prefix of a token.
pub fn fingerprint(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(12)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

    fn codec() -> TokenCodec {
        TokenCodec::new(SigningKey::new(TEST_SECRET).unwrap(), 3_600_000).unwrap()
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let codec = codec();
        let token = codec.issue("alice@example.com").expect("issue should succeed");

        let claims = codec.verify(&token).expect("verify should succeed");
        assert_eq!(claims.sub, "alice@example.com");
        assert!((3600..=3601).contains(&(claims.exp - claims.iat)));
        assert!(!codec.is_expired(&token));
    }

    #[test]
    fn test_lifetime_never_shorter_than_ttl() {
        let codec =
            TokenCodec::new(SigningKey::new(TEST_SECRET).unwrap(), MIN_TTL_MILLIS).unwrap();
        let issued = Utc.timestamp_millis_opt(1_700_000_000_999).unwrap();
        let token = codec.issue_at("hank@example.com", issued).unwrap();

        assert!(codec.verify_at(&token, issued + Duration::milliseconds(1)).is_ok());
        assert!(codec.verify_at(&token, issued + Duration::milliseconds(999)).is_ok());
        assert_eq!(
            codec.verify_at(&token, issued + Duration::milliseconds(1001)),
            Err(TokenError::Expired)
        );

        let whole = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let token = codec.issue_at("hank@example.com", whole).unwrap();
        let claims = codec.verify_at(&token, whole).unwrap();
        assert_eq!(claims.exp - claims.iat, 1);
    }

    #[test]
    fn test_huge_ttl_rejected() {
        let key = SigningKey::new(TEST_SECRET).unwrap();
        assert!(TokenCodec::new(key.clone(), MAX_TTL_MILLIS).is_ok());
        assert!(TokenCodec::new(key.clone(), MAX_TTL_MILLIS + 1).is_err());
        assert!(TokenCodec::new(key, 9_000_000_000_000_000_000).is_err());
    }

    #[test]
    fn test_issue_near_max_instant_errors_instead_of_panicking() {
        let codec = codec();
        assert_eq!(
            codec.issue_at("ivan@example.com", DateTime::<Utc>::MAX_UTC),
            Err(TokenError::InvalidInput)
        );
    }

    #[test]
    fn test_blank_subject_rejected() {
        let codec = codec();
        assert_eq!(codec.issue(""), Err(TokenError::InvalidInput));
        assert_eq!(codec.issue("   "), Err(TokenError::InvalidInput));
    }

    #[test]
    fn test_tokens_for_same_subject_are_distinct() {
        let codec = codec();
        let now = Utc::now();
        let a = codec.issue_at("bob@example.com", now).unwrap();
        let b = codec.issue_at("bob@example.com", now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_once_ttl_elapsed() {
        let codec = codec();
        let issued = Utc::now();
        let token = codec.issue_at("carol@example.com", issued).unwrap();

        let just_before = issued + Duration::minutes(59);
        assert!(codec.verify_at(&token, just_before).is_ok());

        let at_expiry = issued + Duration::hours(1) + Duration::seconds(1);
        assert_eq!(codec.verify_at(&token, at_expiry), Err(TokenError::Expired));
        assert!(codec.is_expired_at(&token, at_expiry));
    }

    #[test]
    fn test_expired_wins_over_bad_signature() {
        let issued = Utc::now() - Duration::hours(2);
        let other = TokenCodec::new(
            SigningKey::new("another-secret-that-is-also-32-bytes!").unwrap(),
            3_600_000,
        )
        .unwrap();
        let token = other.issue_at("dave@example.com", issued).unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let other = TokenCodec::new(
            SigningKey::new("another-secret-that-is-also-32-bytes!").unwrap(),
            3_600_000,
        )
        .unwrap();
        let token = other.issue("erin@example.com").unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::BadSignature));
        assert!(codec().is_expired(&token));
    }

    #[test]
    fn test_flipping_any_signature_byte_is_bad_signature() {
        let codec = codec();
        let token = codec.issue("frank@example.com").unwrap();
        let (message, signature) = token.rsplit_once('.').unwrap();
        let raw = URL_SAFE_NO_PAD.decode(signature).unwrap();

        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let forged = format!("{}.{}", message, URL_SAFE_NO_PAD.encode(&tampered));
            assert_eq!(
                codec.verify(&forged),
                Err(TokenError::BadSignature),
                "byte {} flip should break the signature",
                i
            );
        }
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let codec = codec();
        let token = codec.issue("grace@example.com").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut claims = peek_claims(&token).unwrap();
        claims.sub = "mallory@example.com".to_string();
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], payload, parts[2]);

        assert_eq!(codec.verify(&forged), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = codec();
        for token in ["", "just-random-text", "a.b", "not.a.valid.jwt", "..", "a.!!!.c"] {
            assert_eq!(codec.verify(token), Err(TokenError::Malformed), "{:?}", token);
            assert!(codec.is_expired(token));
        }
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(SigningKey::new("too-short").is_err());
        assert!(SigningKey::new(&"x".repeat(31)).is_err());
        assert!(SigningKey::new(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn test_sub_second_ttl_rejected() {
        let key = SigningKey::new(TEST_SECRET).unwrap();
        assert!(TokenCodec::new(key.clone(), 999).is_err());
        assert!(TokenCodec::new(key, 1000).is_ok());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("Bearer    "), None);
        assert_eq!(extract_bearer("bearer abc"), None);
        assert_eq!(extract_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer(""), None);
    }

    #[test]
    fn test_fingerprint_truncates() {
        assert_eq!(fingerprint("short"), "short");
        assert_eq!(fingerprint("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbGciOiJI");
    }
}
