//! Principal — the validated identity and authorization context
//! attached to a request.
//!
//! Produced transiently by credential validation and threaded through
//! handler signatures explicitly; never persisted and never stored as
//! ambient per-request state.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub session_id: Uuid,
    pub roles: Vec<Role>,
    pub permissions: HashSet<String>,
    pub scopes: HashSet<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Deny by default: absent sets or missing entries fail the check.
    /// The wildcard permission `"*"` grants everything.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission) || self.permissions.contains("*")
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Whether any of the principal's roles may manage `target`,
    /// per [`Role::manageable_roles`].
    pub fn can_manage(&self, target: Role) -> bool {
        self.roles
            .iter()
            .any(|r| r.manageable_roles().contains(&target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn principal(roles: Vec<Role>, permissions: &[&str]) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            roles,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            scopes: HashSet::new(),
            issued_at: Utc::now(),
            expires_at: Utc::now() + Duration::minutes(15),
        }
    }

    #[test]
    fn permission_check_denies_by_default() {
        let p = principal(vec![Role::Employee], &[]);
        assert!(!p.has_permission("orders:write"));
    }

    #[test]
    fn wildcard_grants_everything() {
        let p = principal(vec![Role::Admin], &["*"]);
        assert!(p.has_permission("orders:write"));
        assert!(p.has_permission("anything:at-all"));
    }

    #[test]
    fn manager_can_manage_employee_but_not_admin() {
        let p = principal(vec![Role::Manager], &[]);
        assert!(p.can_manage(Role::Employee));
        assert!(p.can_manage(Role::Customer));
        assert!(!p.can_manage(Role::Admin));
    }
}
