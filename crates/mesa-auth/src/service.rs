//! Session authority — login, validation, refresh rotation, and
//! revocation orchestration.
//!
//! Per-session states: ACTIVE → ROTATED (transient, collapses back to
//! ACTIVE with a new secret) → REVOKED (terminal). The authority holds
//! no mutable in-process state; every mutation goes through the
//! session store's atomic operations, so it scales across processes.

use chrono::{Duration, Utc};
use mesa_core::error::MesaError;
use mesa_core::models::principal::Principal;
use mesa_core::models::session::{CreateSession, DeviceType, SessionView};
use mesa_core::models::user::{Role, UserStatus};
use mesa_core::repository::{SessionRepository, TenantRepository, UserRepository};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, CredentialSubject};

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub device_type: DeviceType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Capabilities bound at issuance; never widened by refresh.
    pub scopes: Vec<String>,
}

/// A freshly-issued credential pair.
#[derive(Debug)]
pub struct TokenPair {
    /// Signed access credential.
    pub access_credential: String,
    /// Raw opaque refresh secret (returned to the client once, never
    /// stored).
    pub refresh_secret: String,
    pub session_id: Uuid,
    /// Access credential lifetime in seconds.
    pub expires_in: u64,
}

/// The session authority.
///
/// Generic over repository implementations so this crate carries no
/// dependency on the database crate.
pub struct AuthService<U, T, S> {
    users: U,
    tenants: T,
    sessions: S,
    config: AuthConfig,
}

impl<U, T, S> AuthService<U, T, S>
where
    U: UserRepository,
    T: TenantRepository,
    S: SessionRepository + Clone + Send + 'static,
{
    pub fn new(users: U, tenants: T, sessions: S, config: AuthConfig) -> Self {
        Self {
            users,
            tenants,
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate with email + password, mint a session, and issue a
    /// credential pair.
    pub async fn login(&self, input: LoginInput) -> Result<TokenPair, AuthError> {
        let user = match self.users.get_by_email(&input.email).await {
            Ok(u) => u,
            Err(MesaError::NotFound { .. }) => {
                debug!("login attempt for unknown identity");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let valid =
            password::verify_password(&input.password, &user.password_hash, self.config.pepper.as_deref())?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        match user.status {
            UserStatus::Active => {}
            UserStatus::Inactive | UserStatus::Suspended => {
                debug!(user_id = %user.id, "login rejected: account not active");
                return Err(AuthError::AccountInactive);
            }
        }

        if !self.tenants.is_active(user.tenant_id).await? {
            debug!(tenant_id = %user.tenant_id, "login rejected: tenant not active");
            return Err(AuthError::TenantInactive);
        }

        let session_id = Uuid::new_v4();
        let now = Utc::now();

        let access_credential = token::issue_access_credential(
            CredentialSubject {
                user_id: user.id,
                tenant_id: user.tenant_id,
                session_id,
                roles: &user.roles,
                permissions: &user.permissions,
                scopes: &input.scopes,
            },
            Duration::seconds(self.config.access_credential_lifetime_secs as i64),
            &self.config,
        )?;

        let refresh_secret = token::generate_refresh_secret();

        self.sessions
            .create(CreateSession {
                id: session_id,
                tenant_id: user.tenant_id,
                user_id: user.id,
                credential_hash: token::hash_secret(&access_credential),
                refresh_secret_hash: token::hash_secret(&refresh_secret),
                roles: user.roles.clone(),
                permissions: user.permissions.clone(),
                scopes: input.scopes,
                device_id: input.device_id,
                device_name: input.device_name,
                device_type: input.device_type,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at: now + Duration::seconds(self.config.session_lifetime_secs as i64),
            })
            .await?;

        // Best effort; a lost stats bump never fails a login.
        if let Err(e) = self.users.touch_login_stats(user.id, now).await {
            debug!(user_id = %user.id, error = %e, "failed to touch login stats");
        }

        info!(user_id = %user.id, session_id = %session_id, "login succeeded");

        Ok(TokenPair {
            access_credential,
            refresh_secret,
            session_id,
            expires_in: self.config.access_credential_lifetime_secs,
        })
    }

    /// Validate an access credential and return the request principal.
    ///
    /// This is the hot path: one signature check plus one session read
    /// and one live tenant-status read. The `last_used_at` touch is
    /// fired on a background task and never blocks the response.
    pub async fn validate(&self, access_credential: &str) -> Result<Principal, AuthError> {
        let claims = token::decode_access_credential(access_credential, &self.config)?;
        let principal = claims.to_principal()?;

        let session = match self.sessions.get_by_id(principal.session_id).await {
            Ok(s) => s,
            // A signed credential referencing a missing session fails
            // closed.
            Err(MesaError::NotFound { .. }) => return Err(AuthError::SessionRevoked),
            Err(e) => return Err(e.into()),
        };

        if session.is_revoked {
            return Err(AuthError::SessionRevoked);
        }

        if !self.tenants.is_active(principal.tenant_id).await? {
            return Err(AuthError::TenantInactive);
        }

        let sessions = self.sessions.clone();
        let session_id = session.id;
        tokio::spawn(async move {
            if let Err(e) = sessions.touch(session_id, Utc::now()).await {
                debug!(session_id = %session_id, error = %e, "failed to touch session");
            }
        });

        Ok(principal)
    }

    /// Rotate a refresh secret: consume the old one and issue a new
    /// pair bound to the same session.
    ///
    /// Roles, permissions, and scopes are carried forward from the
    /// session row — the identity store is never consulted here, so a
    /// permission change takes effect on next login or forced
    /// re-issue.
    pub async fn refresh(&self, refresh_secret: &str) -> Result<TokenPair, AuthError> {
        let presented_hash = token::hash_secret(refresh_secret);

        let session = match self.sessions.get_by_refresh_hash(&presented_hash).await {
            Ok(s) => s,
            Err(MesaError::NotFound { .. }) => return Err(AuthError::InvalidRefresh),
            Err(e) => return Err(e.into()),
        };

        if session.refresh_secret_hash != presented_hash {
            // The presented secret was already rotated away: either the
            // client replayed an old secret or someone stole it. Revoke
            // the session defensively, whatever state it is in.
            warn!(
                session_id = %session.id,
                user_id = %session.user_id,
                "refresh secret reuse detected; revoking session"
            );
            self.sessions
                .revoke(session.id, None, "refresh_reuse_detected")
                .await?;
            return Err(AuthError::ReuseDetected);
        }

        if session.is_revoked {
            return Err(AuthError::SessionRevoked);
        }

        let now = Utc::now();
        if session.expires_at <= now {
            self.sessions
                .revoke(session.id, None, "session_expired")
                .await?;
            return Err(AuthError::Expired);
        }

        let access_credential = token::issue_access_credential(
            CredentialSubject {
                user_id: session.user_id,
                tenant_id: session.tenant_id,
                session_id: session.id,
                roles: &session.roles,
                permissions: &session.permissions,
                scopes: &session.scopes,
            },
            Duration::seconds(self.config.access_credential_lifetime_secs as i64),
            &self.config,
        )?;
        let new_secret = token::generate_refresh_secret();

        match self
            .sessions
            .rotate_refresh(
                session.id,
                &presented_hash,
                &token::hash_secret(&new_secret),
                &token::hash_secret(&access_credential),
                now + Duration::seconds(self.config.session_lifetime_secs as i64),
            )
            .await
        {
            Ok(_) => {}
            // Lost a concurrent rotation race: exactly one of the two
            // callers wins; the loser's secret is no longer valid.
            Err(MesaError::Conflict(_)) => {
                debug!(session_id = %session.id, "refresh rotation lost to concurrent call");
                return Err(AuthError::InvalidRefresh);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(TokenPair {
            access_credential,
            refresh_secret: new_secret,
            session_id: session.id,
            expires_in: self.config.access_credential_lifetime_secs,
        })
    }

    /// Revoke a single session. Idempotent.
    pub async fn logout(
        &self,
        session_id: Uuid,
        actor_id: Option<Uuid>,
        reason: &str,
    ) -> Result<(), AuthError> {
        self.sessions.revoke(session_id, actor_id, reason).await?;
        info!(session_id = %session_id, reason, "session revoked");
        Ok(())
    }

    /// Revoke every session for a user (password change, admin-forced
    /// logout, account-status transitions away from active).
    pub async fn logout_all(
        &self,
        user_id: Uuid,
        actor_id: Option<Uuid>,
        reason: &str,
    ) -> Result<(), AuthError> {
        self.sessions
            .revoke_all_for_user(user_id, actor_id, reason)
            .await?;
        info!(user_id = %user_id, reason, "all sessions revoked");
        Ok(())
    }

    /// Enumerate a user's active sessions, marking the row belonging
    /// to the credential the caller presented.
    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        current_credential: Option<&str>,
    ) -> Result<Vec<SessionView>, AuthError> {
        let current_hash = current_credential.map(token::hash_secret);
        let sessions = self.sessions.list_active_for_user(user_id).await?;

        Ok(sessions
            .iter()
            .map(|s| {
                let is_current = current_hash
                    .as_deref()
                    .is_some_and(|h| h == s.credential_hash);
                s.to_view(is_current)
            })
            .collect())
    }

    /// Revoke a session on behalf of a requester. The session must
    /// belong to the requester unless they hold an admin capability.
    pub async fn revoke_session(
        &self,
        session_id: Uuid,
        requester: &Principal,
    ) -> Result<(), AuthError> {
        let session = match self.sessions.get_by_id(session_id).await {
            Ok(s) => s,
            Err(MesaError::NotFound { .. }) => return Err(AuthError::NotFound),
            Err(e) => return Err(e.into()),
        };

        // Cross-tenant lookups read as not-found rather than leaking
        // another tenant's session ids.
        if session.tenant_id != requester.tenant_id {
            return Err(AuthError::NotFound);
        }

        if session.user_id != requester.user_id
            && !requester.has_role(Role::Admin)
            && !requester.has_permission("sessions:manage")
        {
            return Err(AuthError::Forbidden("cannot revoke another user's session".into()));
        }

        self.sessions
            .revoke(session_id, Some(requester.user_id), "revoked_by_request")
            .await?;
        Ok(())
    }

    /// Change a user's password and revoke every session they hold.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.users.get_by_id(user_id).await?;

        let valid = password::verify_password(
            current_password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = password::hash_password(new_password, self.config.pepper.as_deref())?;
        self.users.update_password(user_id, &new_hash).await?;
        self.logout_all(user_id, Some(user_id), "password_change")
            .await
    }

    /// Transition an account's status. Any transition away from active
    /// revokes every session the user holds.
    pub async fn set_user_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
        actor_id: Uuid,
    ) -> Result<(), AuthError> {
        self.users.set_status(user_id, status).await?;
        if status != UserStatus::Active {
            self.logout_all(user_id, Some(actor_id), "account_status_change")
                .await?;
        }
        Ok(())
    }
}
