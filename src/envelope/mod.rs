//! Envelope encryption for stored credentials
//!
//! Each user's secret is sealed under a random AES session key, and the
//! session key is wrapped under a per-user RSA public key. The durable bundle
//! (key pair + wrapped session key) is the user's *envelope*; the plaintext
//! session key exists only in memory during an operation.

pub mod service;

pub use service::{EnvelopeService, GeneratedEnvelope, SEALED_RECORD_VERSION};
