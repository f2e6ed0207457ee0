//! Storage collaborators
//!
//! The core persists users, key envelopes, refresh tokens, and login history
//! through these trait interfaces. The in-memory implementation in
//! [`memory`] is the production default; a database-backed implementation
//! plugs in behind the same traits.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Result;

pub use memory::{MemoryEnvelopeStore, MemoryLoginHistoryStore, MemoryTokenStore, MemoryUserStore};

/// A registered user. The password is held only as a serialized sealed
/// record; the plaintext never touches storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Serialized sealed record (nonce/tag/ciphertext)
    pub sealed_password: String,
    /// Role name, if one has been assigned
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub sealed_password: String,
    pub role: Option<String>,
}

/// Explicit user update: exactly the mutable fields, nothing dynamic
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub login: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sealed_password: Option<String>,
    pub role: Option<String>,
}

/// Durable key envelope for one user. Append-then-invalidate: a new envelope
/// supersedes the old one, which stays revoked for auditability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEnvelope {
    pub id: Uuid,
    pub user_id: Uuid,
    /// PKCS#8 PEM private key
    pub private_key: String,
    /// SPKI PEM public key
    pub public_key: String,
    /// Session key encrypted under `public_key`
    pub wrapped_session_key: Vec<u8>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl KeyEnvelope {
    pub fn new(
        user_id: Uuid,
        private_key: String,
        public_key: String,
        wrapped_session_key: Vec<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            private_key,
            public_key,
            wrapped_session_key,
            revoked: false,
            created_at: Utc::now(),
        }
    }
}

/// Stored refresh token. At most one non-revoked record exists per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    pub fn new(user_id: Uuid, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at,
            created_at: Utc::now(),
            revoked: false,
        }
    }
}

/// One successful authentication event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

impl LoginEvent {
    pub fn new(user_id: Uuid, ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            ip: ip.into(),
            user_agent: user_agent.into(),
            created_at: Utc::now(),
        }
    }
}

/// User persistence. Uniqueness of login and email is enforced here and
/// surfaced as [`crate::types::VaultgateError::DuplicateIdentifier`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User>;
    /// Look up by login or email
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>>;
}

/// Key envelope persistence
#[async_trait]
pub trait KeyEnvelopeStore: Send + Sync {
    /// Persist an envelope. Any previously active envelope for the user is
    /// revoked within the same atomic boundary.
    async fn save(&self, envelope: KeyEnvelope) -> Result<Uuid>;
    async fn get_active(&self, user_id: Uuid) -> Result<Option<KeyEnvelope>>;
    async fn revoke(&self, user_id: Uuid) -> Result<()>;
    async fn delete(&self, user_id: Uuid) -> Result<()>;
}

/// Refresh token persistence
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a record, atomically revoking any active record the user
    /// already has. Concurrent callers race last-write-wins; a reader never
    /// observes two simultaneously active records.
    async fn save(&self, record: RefreshTokenRecord) -> Result<()>;
    async fn get_active(&self, user_id: Uuid) -> Result<Option<RefreshTokenRecord>>;
    async fn revoke(&self, id: Uuid) -> Result<()>;
    async fn delete_all(&self, user_id: Uuid) -> Result<()>;
}

/// Login history persistence
#[async_trait]
pub trait LoginHistoryStore: Send + Sync {
    async fn record(&self, event: LoginEvent) -> Result<()>;
    async fn for_user(&self, user_id: Uuid) -> Result<Vec<LoginEvent>>;
}
