//! Identity resolution and credential checks against the member store.

use crate::store::{Member, MemberRole, MemberStore, NewMember, StoreError};
use anyhow::Context;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Unknown email or wrong password. Deliberately does not say which.
    #[error("incorrect email or password")]
    BadCredentials,
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Resolves token subjects to members, verifies passwords and registers
/// new accounts. Password hashing runs on the blocking pool.
#[derive(Clone)]
pub struct IdentityResolver {
    members: Arc<dyn MemberStore>,
    bcrypt_cost: u32,
}

impl IdentityResolver {
    pub fn new(members: Arc<dyn MemberStore>, bcrypt_cost: u32) -> Self {
        Self {
            members,
            bcrypt_cost,
        }
    }

    /// The member behind a verified token subject, if it still exists.
    pub async fn lookup(&self, subject: &str) -> anyhow::Result<Option<Member>> {
        self.members.find_by_email(subject).await
    }

    /// Check `email`/`password` and return the matching member.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Member, IdentityError> {
        let Some(member) = self.members.find_by_email(email).await? else {
            debug!(email = %email, "Sign-in for unknown email");
            return Err(IdentityError::BadCredentials);
        };

        let password = password.to_string();
        let hash = member.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .context("password verification task failed")?
            .context("stored password hash is unreadable")?;

        if matches {
            Ok(member)
        } else {
            debug!(email = %email, "Sign-in with wrong password");
            Err(IdentityError::BadCredentials)
        }
    }

    /// Create a member with the default role.
    pub async fn register(&self, email: &str, password: &str) -> Result<Member, IdentityError> {
        if self.members.exists_by_email(email).await? {
            return Err(IdentityError::EmailTaken(email.to_string()));
        }

        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .context("password hashing task failed")?
            .context("failed to hash password")?;

        let member = self
            .members
            .insert(NewMember {
                email: email.to_string(),
                password_hash,
                roles: vec![MemberRole::User],
            })
            .await
            .map_err(|e| match e.downcast::<StoreError>() {
                // Lost the race against a concurrent sign-up for the same email.
                Ok(StoreError::DuplicateEmail(email)) => IdentityError::EmailTaken(email),
                Err(e) => IdentityError::Store(e),
            })?;

        info!(member_id = member.id, email = %member.email, "Registered member");
        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(Arc::new(MemoryStore::new()), 4)
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let identity = resolver();
        let member = identity.register("a@x.com", "abcd1234").await.unwrap();
        assert_eq!(member.roles, vec![MemberRole::User]);
        assert_ne!(member.password_hash, "abcd1234");

        let found = identity.authenticate("a@x.com", "abcd1234").await.unwrap();
        assert_eq!(found.id, member.id);
        assert_eq!(
            identity.lookup("a@x.com").await.unwrap().map(|m| m.id),
            Some(member.id)
        );
    }

    #[tokio::test]
    async fn test_bad_credentials_are_indistinguishable() {
        let identity = resolver();
        identity.register("a@x.com", "abcd1234").await.unwrap();

        let wrong_password = identity.authenticate("a@x.com", "zzzz9999").await;
        let unknown_email = identity.authenticate("b@x.com", "abcd1234").await;
        assert!(matches!(wrong_password, Err(IdentityError::BadCredentials)));
        assert!(matches!(unknown_email, Err(IdentityError::BadCredentials)));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let identity = resolver();
        identity.register("a@x.com", "abcd1234").await.unwrap();
        let err = identity.register("a@x.com", "other1234").await.unwrap_err();
        assert!(matches!(err, IdentityError::EmailTaken(ref e) if e == "a@x.com"));
    }
}
