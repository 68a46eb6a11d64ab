//! Authentication error taxonomy.
//!
//! Every variant except `Store` is a deterministic, non-retryable
//! outcome surfaced directly to the caller; the authority performs no
//! automatic retry. `ReuseDetected` is additionally logged with high
//! severity as a possible-compromise indicator.

use mesa_core::error::MesaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown identity — deliberately the same
    /// error for both, to avoid identity enumeration.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is not active")]
    AccountInactive,

    #[error("tenant is not active")]
    TenantInactive,

    /// Credential structure could not be parsed.
    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("credential signature verification failed")]
    BadSignature,

    #[error("credential has expired")]
    Expired,

    #[error("session has been revoked")]
    SessionRevoked,

    #[error("invalid refresh secret")]
    InvalidRefresh,

    /// A rotated-away refresh secret was presented — a stolen-token
    /// signal, surfaced distinctly rather than flattened to a generic
    /// failure.
    #[error("refresh secret reuse detected")]
    ReuseDetected,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("concurrent rotation lost")]
    Conflict,

    #[error("session not found")]
    NotFound,

    #[error("cryptography error: {0}")]
    Crypto(String),

    /// Store-level failure; the only class the store's own client may
    /// retry.
    #[error("store error: {0}")]
    Store(#[from] MesaError),
}

impl AuthError {
    /// Stable machine-readable kind, used in API error bodies so
    /// callers distinguish outcomes by kind rather than by prose.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountInactive => "account_inactive",
            AuthError::TenantInactive => "tenant_inactive",
            AuthError::Malformed(_) => "malformed",
            AuthError::BadSignature => "bad_signature",
            AuthError::Expired => "expired",
            AuthError::SessionRevoked => "session_revoked",
            AuthError::InvalidRefresh => "invalid_refresh",
            AuthError::ReuseDetected => "reuse_detected",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::Conflict => "conflict",
            AuthError::NotFound => "not_found",
            AuthError::Crypto(_) => "crypto_error",
            AuthError::Store(_) => "store_error",
        }
    }
}
