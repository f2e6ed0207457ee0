//! Authenticated payload encryption with AES-128-GCM
//!
//! Seals the sensitive payload (the user's password) under the per-record
//! session key. The nonce comes from the cipher's own randomized generation,
//! never from the caller, and the 16-byte tag is carried detached so the
//! stored record keeps nonce, tag, and ciphertext independently recoverable.

use aes_gcm::aead::{Aead, AeadCore, OsRng};
use aes_gcm::{Aes128Gcm, KeyInit, Nonce};
use zeroize::Zeroizing;

use crate::types::{Result, VaultgateError};

use super::pool::CryptoPool;

/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// An authenticated-encryption result. Immutable once created; any single-bit
/// corruption makes [`open_blocking`] fail closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

fn cipher_for(session_key: &[u8]) -> Result<Aes128Gcm> {
    Aes128Gcm::new_from_slice(session_key).map_err(|_| {
        VaultgateError::Internal(format!(
            "Invalid session key length: expected 16, got {}",
            session_key.len()
        ))
    })
}

/// Encrypt a payload under a session key (synchronous)
pub fn seal_blocking(plaintext: &str, session_key: &[u8]) -> Result<SealedPayload> {
    let cipher = cipher_for(session_key)?;
    let nonce = Aes128Gcm::generate_nonce(&mut OsRng);

    let mut combined = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| VaultgateError::Internal("AEAD encryption failed".into()))?;

    // aes-gcm appends the tag; detach it so the record stores it separately
    let tag = combined.split_off(combined.len() - TAG_LEN);

    Ok(SealedPayload {
        nonce: nonce.to_vec(),
        tag,
        ciphertext: combined,
    })
}

/// Decrypt and verify a sealed payload (synchronous).
///
/// Tag mismatch, wrong key, or bad nonce length all fail with
/// [`VaultgateError::Integrity`]; no partial plaintext ever escapes.
pub fn open_blocking(sealed: &SealedPayload, session_key: &[u8]) -> Result<Zeroizing<String>> {
    if sealed.nonce.len() != NONCE_LEN || sealed.tag.len() != TAG_LEN {
        return Err(VaultgateError::Integrity);
    }

    let cipher = cipher_for(session_key)?;
    let nonce = Nonce::from_slice(&sealed.nonce);

    let mut combined = Vec::with_capacity(sealed.ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(&sealed.ciphertext);
    combined.extend_from_slice(&sealed.tag);

    let plaintext = cipher
        .decrypt(nonce, combined.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| VaultgateError::Integrity)?;

    String::from_utf8(plaintext.to_vec())
        .map(Zeroizing::new)
        .map_err(|_| VaultgateError::Internal("Decrypted payload is not valid UTF-8".into()))
}

/// Seal a payload on the crypto pool
pub async fn seal(
    pool: &CryptoPool,
    plaintext: Zeroizing<String>,
    session_key: Zeroizing<Vec<u8>>,
) -> Result<SealedPayload> {
    pool.run(move || seal_blocking(&plaintext, &session_key))
        .await
}

/// Open a sealed payload on the crypto pool
pub async fn open(
    pool: &CryptoPool,
    sealed: SealedPayload,
    session_key: Zeroizing<Vec<u8>>,
) -> Result<Zeroizing<String>> {
    pool.run(move || open_blocking(&sealed, &session_key)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random::random_bytes_blocking;

    #[test]
    fn test_seal_open_round_trip() {
        let key = random_bytes_blocking(16).unwrap();
        let sealed = seal_blocking("P@ss1", &key).unwrap();

        // CTR-mode keystream: ciphertext length equals plaintext length
        assert_eq!(sealed.ciphertext.len(), "P@ss1".len());
        assert_eq!(sealed.nonce.len(), NONCE_LEN);
        assert_eq!(sealed.tag.len(), TAG_LEN);

        let opened = open_blocking(&sealed, &key).unwrap();
        assert_eq!(opened.as_str(), "P@ss1");
    }

    #[test]
    fn test_empty_payload() {
        let key = random_bytes_blocking(16).unwrap();
        let sealed = seal_blocking("", &key).unwrap();
        assert!(sealed.ciphertext.is_empty());
        assert_eq!(open_blocking(&sealed, &key).unwrap().as_str(), "");
    }

    #[test]
    fn test_nonce_is_fresh_per_seal() {
        let key = random_bytes_blocking(16).unwrap();
        let a = seal_blocking("same payload", &key).unwrap();
        let b = seal_blocking("same payload", &key).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tamper_any_ciphertext_byte_fails() {
        let key = random_bytes_blocking(16).unwrap();
        let sealed = seal_blocking("sensitive payload", &key).unwrap();

        for i in 0..sealed.ciphertext.len() {
            let mut tampered = sealed.clone();
            tampered.ciphertext[i] ^= 0x01;
            assert!(
                matches!(open_blocking(&tampered, &key), Err(VaultgateError::Integrity)),
                "flip at ciphertext byte {} must fail closed",
                i
            );
        }
    }

    #[test]
    fn test_tamper_any_tag_byte_fails() {
        let key = random_bytes_blocking(16).unwrap();
        let sealed = seal_blocking("sensitive payload", &key).unwrap();

        for i in 0..TAG_LEN {
            let mut tampered = sealed.clone();
            tampered.tag[i] ^= 0x80;
            assert!(matches!(
                open_blocking(&tampered, &key),
                Err(VaultgateError::Integrity)
            ));
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = random_bytes_blocking(16).unwrap();
        let other = random_bytes_blocking(16).unwrap();
        let sealed = seal_blocking("payload", &key).unwrap();
        assert!(matches!(
            open_blocking(&sealed, &other),
            Err(VaultgateError::Integrity)
        ));
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let pool = CryptoPool::default();
        let key = random_bytes_blocking(16).unwrap();

        let sealed = seal(&pool, Zeroizing::new("async payload".into()), key.clone())
            .await
            .unwrap();
        let opened = open(&pool, sealed, key).await.unwrap();
        assert_eq!(opened.as_str(), "async payload");
    }
}
