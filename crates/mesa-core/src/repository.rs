//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The session authority is
//! generic over these traits so it carries no dependency on the
//! database crate; the store is the single source of truth for
//! revocation, and all session mutation is pushed down to the store's
//! atomic operations.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::MesaResult;
use crate::models::{
    session::{CreateSession, Session},
    tenant::{CreateTenant, Tenant, TenantStatus},
    user::{CreateUser, User, UserStatus},
};

/// Identity store. Consumed by login and the password/status
/// operations; never consulted on validate or refresh.
pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = MesaResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MesaResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = MesaResult<User>> + Send;
    fn set_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> impl Future<Output = MesaResult<()>> + Send;
    fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> impl Future<Output = MesaResult<()>> + Send;
    /// Bump login counters after a successful login. Best effort.
    fn touch_login_stats(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = MesaResult<()>> + Send;
}

/// Tenant store. `is_active` is consulted live on every validation so
/// suspension takes effect without waiting for credential expiry.
pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = MesaResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MesaResult<Tenant>> + Send;
    fn set_status(
        &self,
        id: Uuid,
        status: TenantStatus,
    ) -> impl Future<Output = MesaResult<()>> + Send;
    /// Unknown tenants read as inactive (fail closed).
    fn is_active(&self, id: Uuid) -> impl Future<Output = MesaResult<bool>> + Send;
}

/// Persisted session registry — the sole revocation authority.
pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = MesaResult<Session>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MesaResult<Session>> + Send;

    /// Look up a session by refresh-secret hash. Matches either the
    /// current hash or the hash it was rotated from, so callers can
    /// tell a stale (reused) secret apart from an unknown one.
    fn get_by_refresh_hash(
        &self,
        hash: &str,
    ) -> impl Future<Output = MesaResult<Session>> + Send;

    /// Active sessions only: excludes revoked and expired rows.
    fn list_active_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = MesaResult<Vec<Session>>> + Send;

    /// Update `last_used_at`. Losing a touch under load is acceptable.
    fn touch(&self, id: Uuid, at: DateTime<Utc>) -> impl Future<Output = MesaResult<()>> + Send;

    /// Atomic refresh rotation: swaps in the new hashes (and slides the
    /// refresh window to `new_expires_at`) only if the stored refresh
    /// hash still equals `expected_hash` and the session is not
    /// revoked. Fails with [`MesaError::Conflict`] otherwise — two
    /// concurrent rotations of the same secret yield exactly one
    /// success.
    fn rotate_refresh(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        new_credential_hash: &str,
        new_expires_at: DateTime<Utc>,
    ) -> impl Future<Output = MesaResult<Session>> + Send;

    /// Idempotent: revoking an already-revoked session is a no-op
    /// success. Revocation fields are append-only.
    fn revoke(
        &self,
        id: Uuid,
        revoked_by: Option<Uuid>,
        reason: &str,
    ) -> impl Future<Output = MesaResult<()>> + Send;

    fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        revoked_by: Option<Uuid>,
        reason: &str,
    ) -> impl Future<Output = MesaResult<()>> + Send;
}
