//! Credential service
//!
//! Orchestrates the envelope facade, the stores, and the token lifecycle into
//! the user-facing operations: register, authenticate, refresh, logout,
//! credential change, and login history.
//!
//! Authentication failure is deliberately uniform: an unknown identifier, a
//! wrong password, and a corrupted envelope all surface as the same
//! `Unauthorized`, so callers cannot probe which one occurred. Payload
//! corruption is additionally logged, since it signals data damage rather
//! than a bad guess.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::crypto::CryptoPool;
use crate::envelope::EnvelopeService;
use crate::store::{
    KeyEnvelope, KeyEnvelopeStore, LoginEvent, LoginHistoryStore, NewUser, RefreshTokenStore,
    User, UserStore, UserUpdate,
};
use crate::tokens::{TokenLifecycle, TokenPair, TokenStrategy};
use crate::types::{Result, VaultgateError};

/// Role names recognized by [`AuthService::assign_role`]
pub const BUILT_IN_ROLES: &[&str] = &["super_admin", "admin", "user", "subscriber", "guest"];

/// Registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub login: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Credential change input: the new password, and optionally a new login
#[derive(Debug, Clone)]
pub struct CredentialUpdate {
    pub login: Option<String>,
    pub password: String,
}

/// Request origin recorded in login history
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            ip: "unknown".into(),
            user_agent: "unknown".into(),
        }
    }
}

/// The credential and session management service
pub struct AuthService {
    users: Arc<dyn UserStore>,
    envelopes: Arc<dyn KeyEnvelopeStore>,
    history: Arc<dyn LoginHistoryStore>,
    envelope: EnvelopeService,
    lifecycle: TokenLifecycle,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        envelopes: Arc<dyn KeyEnvelopeStore>,
        tokens: Arc<dyn RefreshTokenStore>,
        history: Arc<dyn LoginHistoryStore>,
        envelope: EnvelopeService,
        strategy: TokenStrategy,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let lifecycle = TokenLifecycle::new(strategy, tokens, users.clone())
            .with_ttls(access_ttl, refresh_ttl);
        Self {
            users,
            envelopes,
            history,
            envelope,
            lifecycle,
        }
    }

    /// Convenience constructor wiring the in-memory stores
    pub fn in_memory(secret: &str, rsa_bits: usize, crypto_workers: usize) -> Result<Self> {
        use crate::store::{
            MemoryEnvelopeStore, MemoryLoginHistoryStore, MemoryTokenStore, MemoryUserStore,
        };

        let pool = CryptoPool::new(crypto_workers);
        Ok(Self::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryEnvelopeStore::new()),
            Arc::new(MemoryTokenStore::new()),
            Arc::new(MemoryLoginHistoryStore::new()),
            EnvelopeService::new(pool, rsa_bits),
            TokenStrategy::new(secret)?,
            Duration::minutes(crate::tokens::DEFAULT_ACCESS_TTL_MINUTES),
            Duration::days(crate::tokens::DEFAULT_REFRESH_TTL_DAYS),
        ))
    }

    /// Register a new user.
    ///
    /// Step order matters: all cryptographic work completes before anything
    /// is persisted, so an abandoned or failed registration leaves no partial
    /// state, and the envelope is never saved without its owning user.
    pub async fn register(&self, registration: Registration, client: ClientInfo) -> Result<User> {
        let generated = self.envelope.generate_envelope().await?;
        let sealed_password = self
            .envelope
            .seal_secret(
                Zeroizing::new(registration.password),
                generated.session_key.clone(),
            )
            .await?;

        let user = self
            .users
            .create(NewUser {
                login: registration.login,
                email: registration.email,
                first_name: registration.first_name,
                last_name: registration.last_name,
                sealed_password,
                role: None,
            })
            .await?;

        self.envelopes
            .save(KeyEnvelope::new(
                user.id,
                generated.private_key.to_string(),
                generated.public_key,
                generated.wrapped_session_key,
            ))
            .await?;

        self.history
            .record(LoginEvent::new(user.id, client.ip, client.user_agent))
            .await?;

        info!(user_id = %user.id, login = %user.login, "Registered user");
        Ok(user)
    }

    /// Verify credentials and mint a token pair
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
        client: ClientInfo,
    ) -> Result<TokenPair> {
        let user = self
            .verify_credentials(identifier, password)
            .await
            .map_err(Self::to_unauthorized)?;

        let pair = self.lifecycle.login(user.id, &user.login).await?;
        self.history
            .record(LoginEvent::new(user.id, client.ip, client.user_agent))
            .await?;

        info!(user_id = %user.id, "Authenticated");
        Ok(pair)
    }

    /// Rotate a refresh token into a new pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        self.lifecycle.refresh(refresh_token).await
    }

    /// End the session identified by an access token
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        self.lifecycle.logout(access_token).await
    }

    /// Resolve the user behind a valid access token
    pub async fn current_user(&self, access_token: &str) -> Result<User> {
        let subject = self.lifecycle.verify_access(access_token)?;
        self.users
            .find_by_identifier(&subject)
            .await?
            .ok_or_else(|| VaultgateError::NotFound("User not found".into()))
    }

    /// Change the password (and optionally the login) of the token's owner.
    ///
    /// A fresh envelope is generated and the old one revoked; the previous
    /// private key can no longer unwrap the new sealed password.
    pub async fn change_credentials(
        &self,
        access_token: &str,
        update: CredentialUpdate,
    ) -> Result<User> {
        let user = self.current_user(access_token).await?;

        let generated = self.envelope.generate_envelope().await?;
        let sealed_password = self
            .envelope
            .seal_secret(
                Zeroizing::new(update.password),
                generated.session_key.clone(),
            )
            .await?;

        let updated = self
            .users
            .update(
                user.id,
                UserUpdate {
                    login: update.login,
                    sealed_password: Some(sealed_password),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| VaultgateError::NotFound("User not found".into()))?;

        // Revoke-then-insert; the store keeps the old envelope for audit
        self.envelopes.revoke(user.id).await?;
        self.envelopes
            .save(KeyEnvelope::new(
                user.id,
                generated.private_key.to_string(),
                generated.public_key,
                generated.wrapped_session_key,
            ))
            .await?;

        info!(user_id = %user.id, "Rotated credentials and key envelope");
        Ok(updated)
    }

    /// Login history of the token's owner, oldest first
    pub async fn login_history(&self, access_token: &str) -> Result<Vec<LoginEvent>> {
        let user = self.current_user(access_token).await?;
        self.history.for_user(user.id).await
    }

    /// Assign a built-in role to a user
    pub async fn assign_role(&self, user_id: uuid::Uuid, role: &str) -> Result<User> {
        if !BUILT_IN_ROLES.contains(&role) {
            return Err(VaultgateError::Config(format!("Unknown role: {}", role)));
        }
        self.users
            .update(
                user_id,
                UserUpdate {
                    role: Some(role.to_string()),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| VaultgateError::NotFound("User not found".into()))
    }

    async fn verify_credentials(&self, identifier: &str, password: &str) -> Result<User> {
        let user = self
            .users
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| VaultgateError::NotFound("User not found".into()))?;

        let envelope = self
            .envelopes
            .get_active(user.id)
            .await?
            .ok_or_else(|| VaultgateError::NotFound("No active key envelope".into()))?;

        let session_key = self
            .envelope
            .unwrap_session_key(envelope.wrapped_session_key, &envelope.private_key)
            .await?;

        let stored_password = self
            .envelope
            .open_secret(&user.sealed_password, session_key)
            .await?;

        if stored_password.as_str() != password {
            return Err(VaultgateError::Unauthorized(
                "Invalid identifier or password".into(),
            ));
        }

        Ok(user)
    }

    /// Collapse credential-verification failures into one indistinguishable
    /// `Unauthorized`. Store and entropy failures pass through.
    fn to_unauthorized(err: VaultgateError) -> VaultgateError {
        match err {
            VaultgateError::NotFound(_)
            | VaultgateError::KeyMismatch
            | VaultgateError::Integrity
            | VaultgateError::Unauthorized(_) => {
                VaultgateError::Unauthorized("Invalid identifier or password".into())
            }
            VaultgateError::PayloadFormat(detail) => {
                warn!(detail = %detail, "Sealed credential record is corrupted");
                VaultgateError::Unauthorized("Invalid identifier or password".into())
            }
            other => other,
        }
    }
}
