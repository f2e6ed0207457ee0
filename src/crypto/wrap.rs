//! Session-key wrapping with RSA-OAEP
//!
//! The per-record AES session key is encrypted under the user's public key
//! and stored alongside the key pair. OAEP padding verification means a
//! mismatched private key fails closed instead of yielding garbage bytes.

use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::types::{Result, VaultgateError};

use super::pool::CryptoPool;

/// Encrypt a session key under a public key (synchronous)
pub fn wrap_blocking(session_key: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>> {
    public_key
        .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), session_key)
        .map_err(|e| VaultgateError::Internal(format!("Session key wrap failed: {}", e)))
}

/// Decrypt a wrapped session key with the matching private key (synchronous).
///
/// OAEP padding failure covers both a non-matching private key and a
/// malformed wrapped blob; both surface as [`VaultgateError::KeyMismatch`].
pub fn unwrap_blocking(wrapped: &[u8], private_key: &RsaPrivateKey) -> Result<Zeroizing<Vec<u8>>> {
    private_key
        .decrypt(Oaep::new::<Sha256>(), wrapped)
        .map(Zeroizing::new)
        .map_err(|_| VaultgateError::KeyMismatch)
}

/// Wrap a session key on the crypto pool
pub async fn wrap(
    pool: &CryptoPool,
    session_key: Zeroizing<Vec<u8>>,
    public_key: RsaPublicKey,
) -> Result<Vec<u8>> {
    pool.run(move || wrap_blocking(&session_key, &public_key))
        .await
}

/// Unwrap a session key on the crypto pool
pub async fn unwrap(
    pool: &CryptoPool,
    wrapped: Vec<u8>,
    private_key: RsaPrivateKey,
) -> Result<Zeroizing<Vec<u8>>> {
    pool.run(move || unwrap_blocking(&wrapped, &private_key))
        .await
}
