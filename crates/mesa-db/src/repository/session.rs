//! SurrealDB implementation of [`SessionRepository`].
//!
//! Sessions are never deleted. Revocation sets append-only flags, and
//! refresh rotation is a single conditional UPDATE so that two
//! concurrent rotations of the same secret resolve to exactly one
//! winner without any application-level lock.

use chrono::{DateTime, Utc};
use mesa_core::error::MesaResult;
use mesa_core::models::session::{CreateSession, DeviceType, Session};
use mesa_core::models::user::Role;
use mesa_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    tenant_id: String,
    user_id: String,
    credential_hash: String,
    refresh_secret_hash: String,
    rotated_from_hash: Option<String>,
    roles: Vec<String>,
    permissions: Vec<String>,
    scopes: Vec<String>,
    device_id: Option<String>,
    device_name: Option<String>,
    device_type: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    issued_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    is_revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    revoked_by: Option<String>,
    revoke_reason: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    tenant_id: String,
    user_id: String,
    credential_hash: String,
    refresh_secret_hash: String,
    rotated_from_hash: Option<String>,
    roles: Vec<String>,
    permissions: Vec<String>,
    scopes: Vec<String>,
    device_id: Option<String>,
    device_name: Option<String>,
    device_type: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    issued_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    is_revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    revoked_by: Option<String>,
    revoke_reason: Option<String>,
}

impl SessionRow {
    fn into_session(self, id: Uuid) -> Result<Session, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Decode(format!("invalid tenant UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        let device_type = DeviceType::parse(&self.device_type).ok_or_else(|| {
            DbError::Decode(format!("unknown device type: {}", self.device_type))
        })?;
        let roles = self
            .roles
            .iter()
            .map(|s| Role::parse(s).ok_or_else(|| DbError::Decode(format!("unknown role: {s}"))))
            .collect::<Result<Vec<Role>, DbError>>()?;
        let revoked_by = self
            .revoked_by
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| DbError::Decode(format!("invalid revoked_by UUID: {e}")))?;
        Ok(Session {
            id,
            tenant_id,
            user_id,
            credential_hash: self.credential_hash,
            refresh_secret_hash: self.refresh_secret_hash,
            rotated_from_hash: self.rotated_from_hash,
            roles,
            permissions: self.permissions,
            scopes: self.scopes,
            device_id: self.device_id,
            device_name: self.device_name,
            device_type,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            issued_at: self.issued_at,
            last_used_at: self.last_used_at,
            expires_at: self.expires_at,
            is_revoked: self.is_revoked,
            revoked_at: self.revoked_at,
            revoked_by,
            revoke_reason: self.revoke_reason,
        })
    }
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let row = SessionRow {
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            credential_hash: self.credential_hash,
            refresh_secret_hash: self.refresh_secret_hash,
            rotated_from_hash: self.rotated_from_hash,
            roles: self.roles,
            permissions: self.permissions,
            scopes: self.scopes,
            device_id: self.device_id,
            device_name: self.device_name,
            device_type: self.device_type,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            issued_at: self.issued_at,
            last_used_at: self.last_used_at,
            expires_at: self.expires_at,
            is_revoked: self.is_revoked,
            revoked_at: self.revoked_at,
            revoked_by: self.revoked_by,
            revoke_reason: self.revoke_reason,
        };
        row.into_session(id)
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> MesaResult<Session> {
        let id = input.id;
        let id_str = id.to_string();
        let roles: Vec<String> = input.roles.iter().map(|r| r.as_str().to_string()).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 tenant_id = $tenant_id, \
                 user_id = $user_id, \
                 credential_hash = $credential_hash, \
                 refresh_secret_hash = $refresh_secret_hash, \
                 rotated_from_hash = NONE, \
                 roles = $roles, \
                 permissions = $permissions, \
                 scopes = $scopes, \
                 device_id = $device_id, \
                 device_name = $device_name, \
                 device_type = $device_type, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("credential_hash", input.credential_hash))
            .bind(("refresh_secret_hash", input.refresh_secret_hash))
            .bind(("roles", roles))
            .bind(("permissions", input.permissions))
            .bind(("scopes", input.scopes))
            .bind(("device_id", input.device_id))
            .bind(("device_name", input.device_name))
            .bind(("device_type", input.device_type.as_str()))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        row.into_session(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> MesaResult<Session> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('session', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        row.into_session(id).map_err(Into::into)
    }

    async fn get_by_refresh_hash(&self, hash: &str) -> MesaResult<Session> {
        let hash_owned = hash.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE refresh_secret_hash = $hash \
                    OR rotated_from_hash = $hash",
            )
            .bind(("hash", hash_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: "refresh_hash".into(),
        })?;

        row.try_into_session().map_err(Into::into)
    }

    async fn list_active_for_user(&self, user_id: Uuid) -> MesaResult<Vec<Session>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE user_id = $user_id \
                   AND is_revoked = false \
                   AND expires_at > time::now() \
                 ORDER BY last_used_at DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| r.try_into_session().map_err(Into::into))
            .collect()
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> MesaResult<()> {
        self.db
            .query("UPDATE type::record('session', $id) SET last_used_at = $at")
            .bind(("id", id.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn rotate_refresh(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        new_credential_hash: &str,
        new_expires_at: DateTime<Utc>,
    ) -> MesaResult<Session> {
        let id_str = id.to_string();

        // Optimistic concurrency: the WHERE clause makes the swap
        // conditional on the stored hash still matching the presented
        // one. An empty result means the rotation lost the race or the
        // session was revoked in the meantime.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('session', $id) SET \
                 rotated_from_hash = $expected_hash, \
                 refresh_secret_hash = $new_hash, \
                 credential_hash = $new_credential_hash, \
                 last_used_at = time::now(), \
                 expires_at = $new_expires_at \
                 WHERE refresh_secret_hash = $expected_hash \
                   AND is_revoked = false",
            )
            .bind(("id", id_str.clone()))
            .bind(("expected_hash", expected_hash.to_string()))
            .bind(("new_hash", new_hash.to_string()))
            .bind(("new_credential_hash", new_credential_hash.to_string()))
            .bind(("new_expires_at", new_expires_at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            DbError::Conflict(format!("refresh rotation lost for session {id_str}"))
        })?;

        row.into_session(id).map_err(Into::into)
    }

    async fn revoke(&self, id: Uuid, revoked_by: Option<Uuid>, reason: &str) -> MesaResult<()> {
        // Idempotent: the WHERE clause leaves already-revoked rows
        // untouched, so their original revocation fields survive.
        self.db
            .query(
                "UPDATE type::record('session', $id) SET \
                 is_revoked = true, \
                 revoked_at = time::now(), \
                 revoked_by = $revoked_by, \
                 revoke_reason = $reason \
                 WHERE is_revoked = false",
            )
            .bind(("id", id.to_string()))
            .bind(("revoked_by", revoked_by.map(|u| u.to_string())))
            .bind(("reason", reason.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        revoked_by: Option<Uuid>,
        reason: &str,
    ) -> MesaResult<()> {
        self.db
            .query(
                "UPDATE session SET \
                 is_revoked = true, \
                 revoked_at = time::now(), \
                 revoked_by = $revoked_by, \
                 revoke_reason = $reason \
                 WHERE user_id = $user_id AND is_revoked = false",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("revoked_by", revoked_by.map(|u| u.to_string())))
            .bind(("reason", reason.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
