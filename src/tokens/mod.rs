//! Access and refresh token subsystem
//!
//! [`strategy`] signs and verifies stateless HS256 tokens; [`lifecycle`]
//! layers the per-user session state machine on top: pair issuance, rotation
//! on refresh, and revocation on logout.

pub mod lifecycle;
pub mod strategy;

pub use lifecycle::{TokenLifecycle, TokenPair, DEFAULT_ACCESS_TTL_MINUTES, DEFAULT_REFRESH_TTL_DAYS};
pub use strategy::{extract_bearer, Claims, IssuedToken, TokenKind, TokenStrategy, MIN_SECRET_LEN};
