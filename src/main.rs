//! Vaultgate - credential vault and session service

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vaultgate::service::BUILT_IN_ROLES;
use vaultgate::{Args, AuthService, ClientInfo, Registration, VaultgateError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("vaultgate={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Vaultgate - credential vault");
    info!("======================================");
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("RSA modulus: {} bits", args.rsa_bits);
    info!("Crypto workers: {}", args.crypto_workers);
    info!("Access TTL: {} min, refresh TTL: {} days", args.access_ttl_minutes, args.refresh_ttl_days);
    info!("Roles: {}", BUILT_IN_ROLES.join(", "));

    let secret = args
        .jwt_secret()
        .ok_or_else(|| anyhow::anyhow!("JWT_SECRET is required"))?;
    if args.jwt_secret.is_none() {
        warn!("Using built-in development JWT secret; do not run this in production");
    }

    let service = AuthService::in_memory(&secret, args.rsa_bits, args.crypto_workers)?;

    seed_superuser(&service, &args).await?;

    info!("Vaultgate ready");

    // Run until interrupted
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}

/// Ensure the configured superuser account exists with the super_admin role.
/// Idempotent across restarts: an existing account is left untouched.
async fn seed_superuser(service: &AuthService, args: &Args) -> anyhow::Result<()> {
    let password = match &args.superuser_password {
        Some(password) => password.clone(),
        // validate() already required a password outside dev mode
        None => {
            warn!("Seeding superuser with a development password");
            "admin".to_string()
        }
    };

    let result = service
        .register(
            Registration {
                login: args.superuser_login.clone(),
                email: args.superuser_email.clone(),
                first_name: "Super".into(),
                last_name: "User".into(),
                password,
            },
            ClientInfo::default(),
        )
        .await;

    match result {
        Ok(user) => {
            service.assign_role(user.id, "super_admin").await?;
            info!(login = %user.login, "Seeded superuser");
        }
        Err(VaultgateError::DuplicateIdentifier(_)) => {
            info!(login = %args.superuser_login, "Superuser already present");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
