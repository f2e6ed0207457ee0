//! Error types for Vaultgate
//!
//! One typed failure per condition the calling layer needs to distinguish.
//! The core defines no wire format; `status_code()` is the suggested
//! protocol-level mapping for an HTTP caller.

/// Main error type for Vaultgate operations
#[derive(Debug, thiserror::Error)]
pub enum VaultgateError {
    /// System RNG unavailable. Fatal and unrecoverable.
    #[error("Entropy failure: {0}")]
    EntropyFailure(String),

    /// Private key does not correspond to the public key used for wrapping,
    /// or the wrapped blob is malformed.
    #[error("Key mismatch: session key unwrap failed")]
    KeyMismatch,

    /// Authenticated decryption tag did not verify (tampered ciphertext or
    /// wrong session key). Never accompanied by partial plaintext.
    #[error("Integrity failure: authentication tag mismatch")]
    Integrity,

    /// Stored sealed-payload record is structurally malformed. This is a
    /// data-corruption signal, logged distinctly from normal auth failure.
    #[error("Malformed sealed payload: {0}")]
    PayloadFormat(String),

    /// Token signature mismatch, malformed structure, wrong kind, or missing
    /// subject claim. Not retriable.
    #[error("Invalid token")]
    TokenInvalid,

    /// Token is well-formed and correctly signed but past its expiry. The
    /// client retries via the refresh flow.
    #[error("Token expired")]
    TokenExpired,

    /// Login or email already taken.
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultgateError {
    /// Suggested HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EntropyFailure(_) => 500,
            Self::KeyMismatch => 401,
            Self::Integrity => 401,
            Self::PayloadFormat(_) => 401,
            Self::TokenInvalid => 401,
            Self::TokenExpired => 401,
            Self::DuplicateIdentifier(_) => 409,
            Self::NotFound(_) => 404,
            Self::Unauthorized(_) => 401,
            Self::Store(_) => 503,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// True for conditions the process cannot recover from
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EntropyFailure(_))
    }
}

impl From<serde_json::Error> for VaultgateError {
    fn from(err: serde_json::Error) -> Self {
        Self::PayloadFormat(err.to_string())
    }
}

impl From<tokio::task::JoinError> for VaultgateError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Crypto pool task failed: {}", err))
    }
}

/// Result type alias for Vaultgate operations
pub type Result<T> = std::result::Result<T, VaultgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(VaultgateError::TokenExpired.status_code(), 401);
        assert_eq!(
            VaultgateError::DuplicateIdentifier("login".into()).status_code(),
            409
        );
        assert_eq!(VaultgateError::NotFound("user".into()).status_code(), 404);
        assert_eq!(VaultgateError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_only_entropy_is_fatal() {
        assert!(VaultgateError::EntropyFailure("no rng".into()).is_fatal());
        assert!(!VaultgateError::Integrity.is_fatal());
        assert!(!VaultgateError::TokenInvalid.is_fatal());
    }
}
