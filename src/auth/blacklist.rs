//! Token revocation (logout) on top of stateless JWT verification.
//!
//! A signed token stays valid until its embedded expiry, so signing out needs
//! server-side state: the set of tokens revoked early. Only revoked tokens are
//! tracked, and each entry remembers the token's own expiry so the set can be
//! swept once those tokens would have been rejected anyway.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Storage for tokens invalidated before their natural expiry.
///
/// Implementations must be internally synchronized: a `revoke` that returns
/// before a later `is_revoked` call starts must be visible to that call.
pub trait RevocationStore: Send + Sync {
    /// Revoke a token with no known expiry. Idempotent.
    fn revoke(&self, token: &str);

    /// Revoke a token that expires naturally at `expires_at`. Idempotent.
    fn revoke_until(&self, token: &str, expires_at: DateTime<Utc>) {
        let _ = expires_at;
        self.revoke(token);
    }

    fn is_revoked(&self, token: &str) -> bool;

    /// Remove a revocation. Returns whether the token was revoked.
    fn unrevoke(&self, token: &str) -> bool;

    /// Drop entries whose tokens have expired by `now`. Returns how many were removed.
    fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let _ = now;
        0
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Single-process revocation set backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    revoked: DashMap<String, Option<DateTime<Utc>>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationStore for MemoryRevocationStore {
    fn revoke(&self, token: &str) {
        self.revoked.entry(token.to_string()).or_insert(None);
    }

    fn revoke_until(&self, token: &str, expires_at: DateTime<Utc>) {
        self.revoked
            .entry(token.to_string())
            .and_modify(|existing| {
                // A known expiry never replaces "kept until unrevoked".
                if let Some(at) = existing {
                    *at = (*at).max(expires_at);
                }
            })
            .or_insert(Some(expires_at));
    }

    fn is_revoked(&self, token: &str) -> bool {
        self.revoked.contains_key(token)
    }

    fn unrevoke(&self, token: &str) -> bool {
        self.revoked.remove(token).is_some()
    }

    fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.revoked.len();
        self.revoked
            .retain(|_, expires_at| expires_at.map_or(true, |at| at > now));
        before.saturating_sub(self.revoked.len())
    }

    fn len(&self) -> usize {
        self.revoked.len()
    }
}

/// Periodically prune expired revocations for the lifetime of the process.
pub fn spawn_sweeper(store: Arc<dyn RevocationStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.prune_expired(Utc::now());
            if removed > 0 {
                debug!(removed, remaining = store.len(), "Pruned expired token revocations");
            }
        }
    })
}

// ============================================================================
// Tests
// ============================================================================
