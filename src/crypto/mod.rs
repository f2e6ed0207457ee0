//! Cryptographic primitives for envelope encryption
//!
//! # Algorithms
//!
//! - **Key pairs**: RSA (2048-bit default), PKCS#8/SPKI PEM serialization
//! - **Session-key wrapping**: RSA-OAEP with SHA-256
//! - **Payload encryption**: AES-128-GCM with detached tag
//!
//! All CPU-heavy operations run through [`CryptoPool`] so they never block
//! the async reactor.

pub mod cipher;
pub mod keypair;
pub mod pool;
pub mod random;
pub mod wrap;

pub use cipher::{SealedPayload, NONCE_LEN, TAG_LEN};
pub use keypair::{KeyPairPem, DEFAULT_RSA_BITS};
pub use pool::{CryptoPool, DEFAULT_CRYPTO_WORKERS};
pub use random::SESSION_KEY_LEN;
