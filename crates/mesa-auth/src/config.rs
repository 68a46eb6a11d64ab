//! Authentication configuration.

/// Configuration for the session authority.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for credential signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for credential verification.
    pub jwt_public_key_pem: String,
    /// Access credential lifetime in seconds (default: 900 = 15 min).
    pub access_credential_lifetime_secs: u64,
    /// Session (refresh window) lifetime in seconds
    /// (default: 2_592_000 = 30 days). Must exceed the access
    /// credential lifetime.
    pub session_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id
    /// hashing/verification.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_credential_lifetime_secs: 900,
            session_lifetime_secs: 2_592_000,
            jwt_issuer: "mesa".into(),
            pepper: None,
        }
    }
}
