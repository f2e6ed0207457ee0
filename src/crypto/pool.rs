//! Bounded execution pool for CPU-heavy cryptographic work
//!
//! Key-pair generation, OAEP wrap/unwrap, and AEAD seal/open are CPU-bound and
//! must never run on the async reactor. The pool dispatches them to blocking
//! worker threads behind a semaphore so a burst of registrations cannot starve
//! request dispatch.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::types::{Result, VaultgateError};

/// Default number of concurrently running crypto operations
pub const DEFAULT_CRYPTO_WORKERS: usize = 4;

/// Bounded pool for blocking cryptographic operations
#[derive(Clone)]
pub struct CryptoPool {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl CryptoPool {
    /// Create a pool allowing `max_concurrency` simultaneous operations
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        debug!(max_concurrency, "Crypto pool initialized");
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    /// Run a blocking cryptographic operation off the reactor thread.
    ///
    /// Waits for a pool slot, then executes `op` on a blocking thread. A
    /// caller abandoning the returned future does not interrupt an operation
    /// already running; its result is simply discarded.
    pub async fn run<F, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| VaultgateError::Internal("Crypto pool closed".into()))?;

        let result = tokio::task::spawn_blocking(move || {
            let out = op();
            drop(permit);
            out
        })
        .await?;

        result
    }

    /// Number of currently available pool slots
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Configured concurrency limit
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}

impl Default for CryptoPool {
    fn default() -> Self {
        Self::new(DEFAULT_CRYPTO_WORKERS)
    }
}
