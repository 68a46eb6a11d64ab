//! Session domain model.
//!
//! One session row per logical login (one device/client) — the unit of
//! revocation. Rows are never physically deleted; revocation state is
//! append-only and a session is never un-revoked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Web,
    Mobile,
    Desktop,
    Tablet,
    Api,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Web => "web",
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
            DeviceType::Tablet => "tablet",
            DeviceType::Api => "api",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "web" => Some(DeviceType::Web),
            "mobile" => Some(DeviceType::Mobile),
            "desktop" => Some(DeviceType::Desktop),
            "tablet" => Some(DeviceType::Tablet),
            "api" => Some(DeviceType::Api),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    /// SHA-256 of the currently-issued access credential. Used only to
    /// answer "is this the session the caller is using" when listing
    /// devices — never for validation.
    pub credential_hash: String,
    /// SHA-256 of the current refresh secret. The raw secret is
    /// returned to the client once and never stored.
    pub refresh_secret_hash: String,
    /// Hash the current refresh secret replaced, kept for one rotation
    /// so that presenting a stale secret is detectable as reuse.
    pub rotated_from_hash: Option<String>,
    /// Authorization carried forward on refresh; never widened after
    /// issuance.
    pub roles: Vec<Role>,
    pub permissions: Vec<String>,
    pub scopes: Vec<String>,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub device_type: DeviceType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    /// Refresh window; always exceeds the access credential expiry.
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    /// Actor who revoked the session; `None` for system-initiated
    /// revocation (reuse detection, expiry).
    pub revoked_by: Option<Uuid>,
    pub revoke_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// Assigned by the authority before the row exists, because the
    /// access credential embeds the session id and the row stores that
    /// credential's hash.
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub credential_hash: String,
    pub refresh_secret_hash: String,
    pub roles: Vec<Role>,
    pub permissions: Vec<String>,
    pub scopes: Vec<String>,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub device_type: DeviceType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Client-facing view of an active session, as returned by device
/// enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub device_type: DeviceType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    /// Whether this row belongs to the credential the caller presented.
    pub is_current: bool,
}

impl Session {
    pub fn to_view(&self, is_current: bool) -> SessionView {
        SessionView {
            id: self.id,
            device_id: self.device_id.clone(),
            device_name: self.device_name.clone(),
            device_type: self.device_type,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            issued_at: self.issued_at,
            last_used_at: self.last_used_at,
            is_current,
        }
    }
}
