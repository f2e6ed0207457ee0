//! In-memory store implementations
//!
//! Backed by `DashMap`, keyed per user so the single-active-record invariants
//! hold inside one entry lock. Suitable for single-node deployments and as
//! the reference implementation for the store contracts.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::types::{Result, VaultgateError};

use super::{
    KeyEnvelope, KeyEnvelopeStore, LoginEvent, LoginHistoryStore, NewUser, RefreshTokenRecord,
    RefreshTokenStore, User, UserStore, UserUpdate,
};

/// In-memory user store with unique login and email enforcement
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
    /// Maps both login and email to the owning user id
    identifiers: DashMap<String, Uuid>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_identifier(&self, identifier: &str, id: Uuid) -> Result<()> {
        match self.identifiers.entry(identifier.to_string()) {
            dashmap::Entry::Occupied(e) if *e.get() != id => Err(
                VaultgateError::DuplicateIdentifier(identifier.to_string()),
            ),
            dashmap::Entry::Occupied(_) => Ok(()),
            dashmap::Entry::Vacant(e) => {
                e.insert(id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let id = Uuid::new_v4();

        self.claim_identifier(&new_user.login, id)?;
        if let Err(e) = self.claim_identifier(&new_user.email, id) {
            self.identifiers.remove(&new_user.login);
            return Err(e);
        }

        let user = User {
            id,
            login: new_user.login,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            sealed_password: new_user.sealed_password,
            role: new_user.role,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());

        debug!(user_id = %id, login = %user.login, "Created user");
        Ok(user)
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        let Some(id) = self.identifiers.get(identifier).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
        let old = match self.users.get(&id) {
            Some(u) => u.clone(),
            None => return Ok(None),
        };

        if let Some(ref login) = update.login {
            if *login != old.login {
                self.claim_identifier(login, id)?;
                self.identifiers.remove(&old.login);
            }
        }
        if let Some(ref email) = update.email {
            if *email != old.email {
                if let Err(e) = self.claim_identifier(email, id) {
                    // Roll the login claim back so the update is all-or-nothing
                    if let Some(ref login) = update.login {
                        if *login != old.login {
                            self.identifiers.remove(login);
                            self.identifiers.insert(old.login.clone(), id);
                        }
                    }
                    return Err(e);
                }
                self.identifiers.remove(&old.email);
            }
        }

        let mut user = old;
        if let Some(login) = update.login {
            user.login = login;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(sealed_password) = update.sealed_password {
            user.sealed_password = sealed_password;
        }
        if let Some(role) = update.role {
            user.role = Some(role);
        }

        self.users.insert(id, user.clone());
        Ok(Some(user))
    }
}

/// In-memory key envelope store. History is kept; rotation revokes in place.
#[derive(Default)]
pub struct MemoryEnvelopeStore {
    envelopes: DashMap<Uuid, Vec<KeyEnvelope>>,
}

impl MemoryEnvelopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total envelopes stored for a user, revoked ones included
    pub fn history_len(&self, user_id: Uuid) -> usize {
        self.envelopes.get(&user_id).map_or(0, |v| v.len())
    }
}

#[async_trait]
impl KeyEnvelopeStore for MemoryEnvelopeStore {
    async fn save(&self, envelope: KeyEnvelope) -> Result<Uuid> {
        let id = envelope.id;
        let mut entry = self.envelopes.entry(envelope.user_id).or_default();
        for prior in entry.iter_mut() {
            prior.revoked = true;
        }
        entry.push(envelope);
        Ok(id)
    }

    async fn get_active(&self, user_id: Uuid) -> Result<Option<KeyEnvelope>> {
        Ok(self
            .envelopes
            .get(&user_id)
            .and_then(|v| v.iter().rev().find(|e| !e.revoked).cloned()))
    }

    async fn revoke(&self, user_id: Uuid) -> Result<()> {
        if let Some(mut entry) = self.envelopes.get_mut(&user_id) {
            for envelope in entry.iter_mut() {
                envelope.revoked = true;
            }
        }
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> Result<()> {
        self.envelopes.remove(&user_id);
        Ok(())
    }
}

/// In-memory refresh token store
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: DashMap<Uuid, Vec<RefreshTokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of non-revoked records for a user
    pub fn active_count(&self, user_id: Uuid) -> usize {
        self.tokens
            .get(&user_id)
            .map_or(0, |v| v.iter().filter(|r| !r.revoked).count())
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryTokenStore {
    async fn save(&self, record: RefreshTokenRecord) -> Result<()> {
        // One entry lock covers revoke-old plus insert-new
        let mut entry = self.tokens.entry(record.user_id).or_default();
        for prior in entry.iter_mut() {
            prior.revoked = true;
        }
        entry.push(record);
        Ok(())
    }

    async fn get_active(&self, user_id: Uuid) -> Result<Option<RefreshTokenRecord>> {
        let now = Utc::now();
        Ok(self.tokens.get(&user_id).and_then(|v| {
            v.iter()
                .rev()
                .find(|r| !r.revoked && r.expires_at > now)
                .cloned()
        }))
    }

    async fn revoke(&self, id: Uuid) -> Result<()> {
        for mut entry in self.tokens.iter_mut() {
            if let Some(record) = entry.iter_mut().find(|r| r.id == id) {
                record.revoked = true;
                return Ok(());
            }
        }
        Ok(())
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<()> {
        self.tokens.remove(&user_id);
        Ok(())
    }
}

/// In-memory login history store
#[derive(Default)]
pub struct MemoryLoginHistoryStore {
    events: DashMap<Uuid, Vec<LoginEvent>>,
}

impl MemoryLoginHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoginHistoryStore for MemoryLoginHistoryStore {
    async fn record(&self, event: LoginEvent) -> Result<()> {
        self.events.entry(event.user_id).or_default().push(event);
        Ok(())
    }

    async fn for_user(&self, user_id: Uuid) -> Result<Vec<LoginEvent>> {
        Ok(self.events.get(&user_id).map(|v| v.clone()).unwrap_or_default())
    }
}
