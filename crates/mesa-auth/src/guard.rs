//! Access-guard helpers: credential extraction and capability checks.
//!
//! Every check fails closed — an absent set or missing entry denies.
//! The transport layer calls [`extract_bearer`], hands the credential
//! to the authority's `validate`, and threads the resulting
//! [`Principal`] explicitly into handlers.

use mesa_core::models::principal::Principal;
use mesa_core::models::user::Role;

use crate::error::AuthError;

/// Pull the credential out of an `Authorization` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or_else(|| AuthError::Malformed("missing bearer credential".into()))?;
    let credential = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::Malformed("not a bearer credential".into()))?
        .trim();
    if credential.is_empty() {
        return Err(AuthError::Malformed("empty bearer credential".into()));
    }
    Ok(credential)
}

/// Require a permission on the principal (`"*"` grants all).
pub fn require_permission(principal: &Principal, permission: &str) -> Result<(), AuthError> {
    if principal.has_permission(permission) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(format!(
            "missing permission: {permission}"
        )))
    }
}

/// Require a role on the principal.
pub fn require_role(principal: &Principal, role: Role) -> Result<(), AuthError> {
    if principal.has_role(role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(format!("missing role: {role}")))
    }
}

/// Require that the principal may manage users holding `target`,
/// per the central role hierarchy ([`Role::manageable_roles`]).
pub fn require_can_manage(principal: &Principal, target: Role) -> Result<(), AuthError> {
    if principal.can_manage(target) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(format!("cannot manage role: {target}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::HashSet;
    use uuid::Uuid;

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
    fn bearer_extraction() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert!(extract_bearer(None).is_err());
        assert!(extract_bearer(Some("Basic dXNlcjpwdw==")).is_err());
        assert!(extract_bearer(Some("Bearer ")).is_err());
    }

    #[test]
    fn permission_check_fails_closed() {
        let p = principal(vec![Role::Employee], &["orders:read"]);
        assert!(require_permission(&p, "orders:read").is_ok());
        assert!(matches!(
            require_permission(&p, "orders:write").unwrap_err(),
            AuthError::Forbidden(_)
        ));
    }

    #[test]
    fn role_check() {
        let p = principal(vec![Role::Manager], &[]);
        assert!(require_role(&p, Role::Manager).is_ok());
        assert!(require_role(&p, Role::Admin).is_err());
    }

    #[test]
    fn manage_check_follows_hierarchy() {
        let manager = principal(vec![Role::Manager], &[]);
        assert!(require_can_manage(&manager, Role::Employee).is_ok());
        assert!(require_can_manage(&manager, Role::Manager).is_err());

        let admin = principal(vec![Role::Admin], &[]);
        assert!(require_can_manage(&admin, Role::Manager).is_ok());
    }
}
