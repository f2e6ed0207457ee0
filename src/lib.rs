//! Vaultgate - credential vault and session service
//!
//! Vaultgate stores user passwords under per-user envelope encryption and
//! manages access/refresh token sessions on top of them.
//!
//! ## Subsystems
//!
//! - **Crypto**: bounded worker pool, RSA key pairs, OAEP key wrapping, AES-GCM sealing
//! - **Envelope**: the facade composing those primitives and the sealed record format
//! - **Store**: trait seams for users, envelopes, refresh tokens, and login history
//! - **Tokens**: HS256 issuance and the refresh rotation state machine
//! - **Service**: register / authenticate / refresh / logout / credential change

pub mod config;
pub mod crypto;
pub mod envelope;
pub mod service;
pub mod store;
pub mod tokens;
pub mod types;

pub use config::Args;
pub use service::{AuthService, ClientInfo, CredentialUpdate, Registration};
pub use types::{Result, VaultgateError};
