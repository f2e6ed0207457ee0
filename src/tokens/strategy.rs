//! Stateless token signing and verification
//!
//! Tokens are HS256 JWTs carrying subject, kind, and expiry. Verification is
//! a pure function of the token string and the server secret: no I/O, no
//! shared mutable state, safe to call concurrently.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Result, VaultgateError};

/// Minimum accepted signing secret length
pub const MIN_SECRET_LEN: usize = 32;

/// Distinguishes access from refresh tokens at the claim level, so a token of
/// one kind cannot be replayed as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User login
    pub sub: String,
    /// Token kind
    pub kind: TokenKind,
    /// Unique token id. `iat`/`exp` have one-second granularity, so without
    /// this two tokens minted in the same second would be byte-identical and
    /// rotation could not tell old from new.
    pub jti: Uuid,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// A signed token together with the claims baked into it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// HMAC-signed token issuer and verifier
#[derive(Clone)]
pub struct TokenStrategy {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenStrategy {
    /// Create a strategy from the server secret.
    ///
    /// Rejects secrets shorter than [`MIN_SECRET_LEN`] characters.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(VaultgateError::Config(format!(
                "JWT secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        let mut validation = Validation::default();
        // Expiry boundaries are exact; no clock leeway
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign a token for `subject` expiring after `ttl`.
    ///
    /// The returned claims are the single source of truth for anything the
    /// caller persists about the token, such as the record expiry.
    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<IssuedToken> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| VaultgateError::Internal(format!("Token signing failed: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token and return its subject.
    ///
    /// Fails with [`VaultgateError::TokenExpired`] when past expiry, and with
    /// [`VaultgateError::TokenInvalid`] on signature mismatch, malformed
    /// structure, missing subject, or a kind other than `expected_kind`.
    pub fn verify(&self, token: &str, expected_kind: TokenKind) -> Result<String> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => VaultgateError::TokenExpired,
                _ => VaultgateError::TokenInvalid,
            }
        })?;

        if data.claims.sub.is_empty() || data.claims.kind != expected_kind {
            return Err(VaultgateError::TokenInvalid);
        }

        Ok(data.claims.sub)
    }
}

/// Extract a bearer token from an Authorization header value.
///
/// The core takes bare token strings; this is the helper an embedding
/// protocol layer uses to lift them out of HTTP requests.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> TokenStrategy {
        TokenStrategy::new("test-secret-that-is-at-least-32-chars!!").unwrap()
    }

    #[test]
    fn test_secret_length_enforced() {
        assert!(TokenStrategy::new("short").is_err());
        assert!(TokenStrategy::new(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn test_issue_and_verify() {
        let strategy = strategy();
        let issued = strategy
            .issue("alice", TokenKind::Access, Duration::minutes(60))
            .unwrap();

        let subject = strategy.verify(&issued.token, TokenKind::Access).unwrap();
        assert_eq!(subject, "alice");
        assert_eq!(issued.claims.exp, issued.claims.iat + 3600);
    }

    #[test]
    fn test_same_second_tokens_are_distinct() {
        let strategy = strategy();
        let a = strategy
            .issue("alice", TokenKind::Refresh, Duration::minutes(60))
            .unwrap();
        let b = strategy
            .issue("alice", TokenKind::Refresh, Duration::minutes(60))
            .unwrap();

        // Identical subject, kind, and second-granularity timestamps must
        // still yield different tokens, or rotation cannot tell them apart
        assert_ne!(a.claims.jti, b.claims.jti);
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_expired_token_is_distinguishable() {
        let strategy = strategy();
        let issued = strategy
            .issue("alice", TokenKind::Access, Duration::seconds(-1))
            .unwrap();

        assert!(matches!(
            strategy.verify(&issued.token, TokenKind::Access),
            Err(VaultgateError::TokenExpired)
        ));
    }

    #[test]
    fn test_not_yet_expired_token_verifies() {
        let strategy = strategy();
        let issued = strategy
            .issue("alice", TokenKind::Access, Duration::seconds(5))
            .unwrap();
        assert_eq!(
            strategy.verify(&issued.token, TokenKind::Access).unwrap(),
            "alice"
        );
    }

    #[test]
    fn test_kind_is_enforced() {
        let strategy = strategy();
        let access = strategy
            .issue("alice", TokenKind::Access, Duration::minutes(60))
            .unwrap();

        // An access token presented where a refresh token is expected
        assert!(matches!(
            strategy.verify(&access.token, TokenKind::Refresh),
            Err(VaultgateError::TokenInvalid)
        ));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let issued = strategy()
            .issue("alice", TokenKind::Access, Duration::minutes(60))
            .unwrap();
        let other = TokenStrategy::new("another-secret-that-is-32-chars-long!").unwrap();

        assert!(matches!(
            other.verify(&issued.token, TokenKind::Access),
            Err(VaultgateError::TokenInvalid)
        ));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        assert!(matches!(
            strategy().verify("not.a.jwt", TokenKind::Access),
            Err(VaultgateError::TokenInvalid)
        ));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let strategy = strategy();
        let issued = strategy
            .issue("", TokenKind::Access, Duration::minutes(60))
            .unwrap();
        assert!(matches!(
            strategy.verify(&issued.token, TokenKind::Access),
            Err(VaultgateError::TokenInvalid)
        ));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_bearer(Some("Basic abc123")), None);
        assert_eq!(extract_bearer(Some("Bearer ")), None);
        assert_eq!(extract_bearer(None), None);
    }
}
