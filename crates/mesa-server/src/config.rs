//! Environment-driven server configuration.

use anyhow::{Context, bail};
use mesa_auth::AuthConfig;
use mesa_db::DbConfig;

/// Full server configuration, assembled from `MESA_*` environment
/// variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (default `127.0.0.1:8080`).
    pub listen_addr: String,
    pub db: DbConfig,
    pub auth: AuthConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let auth = AuthConfig {
            jwt_private_key_pem: std::env::var("MESA_JWT_PRIVATE_KEY")
                .context("MESA_JWT_PRIVATE_KEY is required (PEM-encoded Ed25519 private key)")?,
            jwt_public_key_pem: std::env::var("MESA_JWT_PUBLIC_KEY")
                .context("MESA_JWT_PUBLIC_KEY is required (PEM-encoded Ed25519 public key)")?,
            access_credential_lifetime_secs: env_or("MESA_ACCESS_LIFETIME_SECS", "900")
                .parse()
                .context("MESA_ACCESS_LIFETIME_SECS must be an integer")?,
            session_lifetime_secs: env_or("MESA_SESSION_LIFETIME_SECS", "2592000")
                .parse()
                .context("MESA_SESSION_LIFETIME_SECS must be an integer")?,
            jwt_issuer: env_or("MESA_JWT_ISSUER", "mesa"),
            pepper: std::env::var("MESA_PASSWORD_PEPPER").ok(),
        };

        // The refresh window must outlive any access credential it can
        // mint.
        if auth.session_lifetime_secs <= auth.access_credential_lifetime_secs {
            bail!("MESA_SESSION_LIFETIME_SECS must exceed MESA_ACCESS_LIFETIME_SECS");
        }

        Ok(Self {
            listen_addr: env_or("MESA_LISTEN_ADDR", "127.0.0.1:8080"),
            db: DbConfig {
                url: env_or("MESA_DB_URL", "127.0.0.1:8000"),
                namespace: env_or("MESA_DB_NAMESPACE", "mesa"),
                database: env_or("MESA_DB_DATABASE", "main"),
                username: env_or("MESA_DB_USERNAME", "root"),
                password: env_or("MESA_DB_PASSWORD", "root"),
            },
            auth,
        })
    }
}
