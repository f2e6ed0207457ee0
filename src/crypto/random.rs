//! Cryptographically secure random key material
//!
//! Session keys come from the OS RNG. `OsRng` read failures mean system
//! entropy is unavailable, which is fatal; there is no degraded mode.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::types::{Result, VaultgateError};

use super::pool::CryptoPool;

/// Session key length in bytes (AES-128)
pub const SESSION_KEY_LEN: usize = 16;

/// Fill a buffer of exactly `n` bytes from the OS RNG.
///
/// Runs synchronously; use [`random_bytes`] from async contexts.
pub fn random_bytes_blocking(n: usize) -> Result<Zeroizing<Vec<u8>>> {
    let mut bytes = Zeroizing::new(vec![0u8; n]);
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| VaultgateError::EntropyFailure(format!("OS RNG unavailable: {}", e)))?;
    Ok(bytes)
}

/// Generate `n` random bytes without blocking the reactor thread
pub async fn random_bytes(pool: &CryptoPool, n: usize) -> Result<Zeroizing<Vec<u8>>> {
    pool.run(move || random_bytes_blocking(n)).await
}

/// Generate a fresh session key for envelope encryption
pub async fn session_key(pool: &CryptoPool) -> Result<Zeroizing<Vec<u8>>> {
    random_bytes(pool, SESSION_KEY_LEN).await
}
