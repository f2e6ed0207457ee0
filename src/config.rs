//! Configuration for Vaultgate
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;

use crate::tokens::MIN_SECRET_LEN;

/// Vaultgate - credential vault and session service
#[derive(Parser, Debug, Clone)]
#[command(name = "vaultgate")]
#[command(about = "Credential vault with envelope encryption and token sessions")]
pub struct Args {
    /// Enable development mode (permits the built-in insecure JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JWT signing secret (required in production, minimum 32 characters)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in minutes
    #[arg(long, env = "ACCESS_TTL_MINUTES", default_value = "60")]
    pub access_ttl_minutes: i64,

    /// Refresh token lifetime in days
    #[arg(long, env = "REFRESH_TTL_DAYS", default_value = "7")]
    pub refresh_ttl_days: i64,

    /// RSA modulus size in bits for per-user key envelopes
    #[arg(long, env = "RSA_BITS", default_value = "2048")]
    pub rsa_bits: usize,

    /// Maximum concurrent CPU-bound crypto operations
    #[arg(long, env = "CRYPTO_WORKERS", default_value = "4")]
    pub crypto_workers: usize,

    /// Login of the seeded superuser account
    #[arg(long, env = "SUPERUSER_LOGIN", default_value = "admin")]
    pub superuser_login: String,

    /// Email of the seeded superuser account
    #[arg(long, env = "SUPERUSER_EMAIL", default_value = "admin@localhost")]
    pub superuser_email: String,

    /// Password of the seeded superuser account (dev mode only if unset)
    #[arg(long, env = "SUPERUSER_PASSWORD")]
    pub superuser_password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Effective JWT secret (falls back to an insecure default in dev mode)
    pub fn jwt_secret(&self) -> Option<String> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Some(secret.clone()),
            (None, true) => Some("dev-only-insecure-secret-change-me!!".to_string()),
            (None, false) => None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match &self.jwt_secret {
            None if !self.dev_mode => {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(format!(
                    "JWT_SECRET must be at least {} characters",
                    MIN_SECRET_LEN
                ));
            }
            _ => {}
        }

        if self.superuser_password.is_none() && !self.dev_mode {
            return Err("SUPERUSER_PASSWORD is required in production mode".to_string());
        }

        if self.access_ttl_minutes <= 0 || self.refresh_ttl_days <= 0 {
            return Err("Token lifetimes must be positive".to_string());
        }

        if self.rsa_bits < 2048 {
            return Err("RSA_BITS must be at least 2048".to_string());
        }

        if self.crypto_workers == 0 {
            return Err("CRYPTO_WORKERS must be at least 1".to_string());
        }

        Ok(())
    }
}
