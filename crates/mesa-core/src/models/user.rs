//! User domain model.
//!
//! Roles are a fixed enumeration rather than free-form strings; role
//! strings coming from storage or from token claims are parsed at the
//! boundary and rejected if unknown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(UserStatus::Active),
            "inactive" => Some(UserStatus::Inactive),
            "suspended" => Some(UserStatus::Suspended),
            _ => None,
        }
    }
}

/// Platform roles, ordered roughly by authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Employee,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
            Role::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "employee" => Some(Role::Employee),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }

    /// The single source of truth for the role hierarchy: which roles a
    /// holder of `self` is allowed to manage. Consulted by the access
    /// guard; never re-implemented per endpoint.
    pub fn manageable_roles(&self) -> &'static [Role] {
        match self {
            Role::Admin => &[Role::Admin, Role::Manager, Role::Employee, Role::Customer],
            Role::Manager => &[Role::Employee, Role::Customer],
            Role::Employee | Role::Customer => &[],
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    /// Permission strings (e.g. `orders:write`). `"*"` grants all.
    pub permissions: Vec<String>,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub login_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    /// Argon2id PHC-format hash; hashing happens above this layer.
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub permissions: Vec<String>,
    pub status: UserStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_round_trip() {
        for role in [Role::Admin, Role::Manager, Role::Employee, Role::Customer] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn manager_manages_employee_and_customer_only() {
        let m = Role::Manager.manageable_roles();
        assert!(m.contains(&Role::Employee));
        assert!(m.contains(&Role::Customer));
        assert!(!m.contains(&Role::Manager));
        assert!(!m.contains(&Role::Admin));
    }

    #[test]
    fn admin_manages_all_roles() {
        let m = Role::Admin.manageable_roles();
        assert_eq!(m.len(), 4);
    }
}
