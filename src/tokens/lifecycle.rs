//! Token lifecycle manager
//!
//! Coordinates access+refresh pair issuance, the single-active-refresh-token
//! invariant, rotation on refresh, and revocation on logout. Per user the
//! session is a two-state machine: no session, or one active refresh record.

use std::sync::Arc;

use chrono::{DateTime, Duration};
use serde::Serialize;
use tracing::{debug, info};

use crate::store::{RefreshTokenRecord, RefreshTokenStore, UserStore};
use crate::types::{Result, VaultgateError};

use super::strategy::{TokenKind, TokenStrategy};

/// Default access token lifetime
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 60;

/// Default refresh token lifetime
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// A coherent access+refresh pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Issues, rotates, and revokes token pairs
pub struct TokenLifecycle {
    strategy: TokenStrategy,
    tokens: Arc<dyn RefreshTokenStore>,
    users: Arc<dyn UserStore>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenLifecycle {
    pub fn new(
        strategy: TokenStrategy,
        tokens: Arc<dyn RefreshTokenStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            strategy,
            tokens,
            users,
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Mint a fresh pair and make its refresh record the user's only active
    /// one. Called after successful authentication and on every rotation.
    ///
    /// Concurrent calls for the same user race last-write-wins: the later
    /// record becomes canonical and the earlier refresh token dies on its
    /// next use, which is the intended posture.
    pub async fn login(&self, user_id: uuid::Uuid, subject: &str) -> Result<TokenPair> {
        let access = self
            .strategy
            .issue(subject, TokenKind::Access, self.access_ttl)?;
        let refresh = self
            .strategy
            .issue(subject, TokenKind::Refresh, self.refresh_ttl)?;

        // The record expires exactly when the token's own exp claim says
        let expires_at = DateTime::from_timestamp(refresh.claims.exp, 0)
            .ok_or_else(|| VaultgateError::Internal("Refresh expiry out of range".into()))?;
        self.tokens
            .save(RefreshTokenRecord::new(
                user_id,
                refresh.token.clone(),
                expires_at,
            ))
            .await?;

        debug!(user_id = %user_id, subject = %subject, "Issued token pair");

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "bearer",
        })
    }

    /// Rotate: verify the presented refresh token, require it to be the
    /// user's current active record, then issue a brand-new pair. The old
    /// refresh token is single-use; a second rotation with it fails.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair> {
        let subject = self.strategy.verify(presented, TokenKind::Refresh)?;

        let user = self
            .users
            .find_by_identifier(&subject)
            .await?
            .ok_or_else(|| VaultgateError::Unauthorized("Unknown token subject".into()))?;

        let active = self
            .tokens
            .get_active(user.id)
            .await?
            .filter(|record| record.token == presented)
            .ok_or_else(|| {
                VaultgateError::Unauthorized("Refresh token revoked or superseded".into())
            })?;

        debug!(user_id = %user.id, record_id = %active.id, "Rotating refresh token");
        self.login(user.id, &subject).await
    }

    /// Revoke the user's active refresh record. The access token itself is
    /// not server-trackable and simply expires.
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        let subject = self.strategy.verify(access_token, TokenKind::Access)?;

        let user = self
            .users
            .find_by_identifier(&subject)
            .await?
            .ok_or_else(|| VaultgateError::Unauthorized("Unknown token subject".into()))?;

        if let Some(record) = self.tokens.get_active(user.id).await? {
            self.tokens.revoke(record.id).await?;
            info!(user_id = %user.id, "Session revoked");
        }

        Ok(())
    }

    /// Verify an access token and return its subject
    pub fn verify_access(&self, access_token: &str) -> Result<String> {
        self.strategy.verify(access_token, TokenKind::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryTokenStore, MemoryUserStore, NewUser, User};

    const SECRET: &str = "lifecycle-test-secret-32-chars-min!!";

    async fn setup() -> (TokenLifecycle, Arc<MemoryTokenStore>, User) {
        let users = Arc::new(MemoryUserStore::new());
        let tokens = Arc::new(MemoryTokenStore::new());
        let user = users
            .create(NewUser {
                login: "alice".into(),
                email: "alice@example.com".into(),
                first_name: "Alice".into(),
                last_name: "Tester".into(),
                sealed_password: "{}".into(),
                role: None,
            })
            .await
            .unwrap();

        let lifecycle = TokenLifecycle::new(
            TokenStrategy::new(SECRET).unwrap(),
            tokens.clone() as Arc<dyn RefreshTokenStore>,
            users as Arc<dyn UserStore>,
        );
        (lifecycle, tokens, user)
    }

    #[tokio::test]
    async fn test_login_persists_single_active_record() {
        let (lifecycle, tokens, user) = setup().await;

        let pair = lifecycle.login(user.id, &user.login).await.unwrap();
        assert_eq!(pair.token_type, "bearer");
        assert_ne!(pair.access_token, pair.refresh_token);

        let record = tokens.get_active(user.id).await.unwrap().unwrap();
        assert_eq!(record.token, pair.refresh_token);

        // A second login replaces, never duplicates
        let second = lifecycle.login(user.id, &user.login).await.unwrap();
        assert_eq!(tokens.active_count(user.id), 1);
        let record = tokens.get_active(user.id).await.unwrap().unwrap();
        assert_eq!(record.token, second.refresh_token);
    }

    #[tokio::test]
    async fn test_record_expiry_matches_token_claim() {
        let (lifecycle, tokens, user) = setup().await;
        let pair = lifecycle.login(user.id, &user.login).await.unwrap();

        let decoded = jsonwebtoken::decode::<crate::tokens::Claims>(
            &pair.refresh_token,
            &jsonwebtoken::DecodingKey::from_secret(SECRET.as_bytes()),
            &jsonwebtoken::Validation::default(),
        )
        .unwrap();

        // One source of truth: the stored expiry is the token's own exp claim
        let record = tokens.get_active(user.id).await.unwrap().unwrap();
        assert_eq!(record.expires_at.timestamp(), decoded.claims.exp);
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_old_token_is_single_use() {
        let (lifecycle, _, user) = setup().await;
        let first = lifecycle.login(user.id, &user.login).await.unwrap();

        let second = lifecycle.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);

        // Replaying the consumed token fails
        let replay = lifecycle.refresh(&first.refresh_token).await;
        assert!(matches!(replay, Err(VaultgateError::Unauthorized(_))));

        // The newest one still works
        assert!(lifecycle.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let (lifecycle, _, user) = setup().await;
        let pair = lifecycle.login(user.id, &user.login).await.unwrap();

        assert!(matches!(
            lifecycle.refresh(&pair.access_token).await,
            Err(VaultgateError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh() {
        let (lifecycle, tokens, user) = setup().await;
        let pair = lifecycle.login(user.id, &user.login).await.unwrap();

        lifecycle.logout(&pair.access_token).await.unwrap();
        assert_eq!(tokens.active_count(user.id), 0);

        assert!(matches!(
            lifecycle.refresh(&pair.refresh_token).await,
            Err(VaultgateError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (lifecycle, _, user) = setup().await;
        let pair = lifecycle.login(user.id, &user.login).await.unwrap();

        lifecycle.logout(&pair.access_token).await.unwrap();
        // Second logout finds no active record and still succeeds
        lifecycle.logout(&pair.access_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_with_garbage_fails_without_state_change() {
        let (lifecycle, tokens, user) = setup().await;
        let pair = lifecycle.login(user.id, &user.login).await.unwrap();

        assert!(lifecycle.refresh("garbage").await.is_err());

        // State unchanged: the original refresh token still rotates
        assert_eq!(tokens.active_count(user.id), 1);
        assert!(lifecycle.refresh(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_logins_leave_one_active() {
        let (lifecycle, tokens, user) = setup().await;
        let lifecycle = Arc::new(lifecycle);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lifecycle = Arc::clone(&lifecycle);
            let login = user.login.clone();
            let id = user.id;
            handles.push(tokio::spawn(async move { lifecycle.login(id, &login).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(tokens.active_count(user.id), 1);
    }
}
