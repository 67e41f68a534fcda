//! Authorization predicates.
//!
//! Pure evaluation over already-loaded role data; no I/O, no side
//! effects. The service layer calls these before every mutating
//! operation; a failed check must fire before any side effect.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{VigilError, VigilResult};
use crate::models::user::{Role, User};

/// A named permission derived from a role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Capability {
    View,
    Create,
    Edit,
    Delete,
    ManageUsers,
    ClearAll,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::View => "view",
            Capability::Create => "create",
            Capability::Edit => "edit",
            Capability::Delete => "delete",
            Capability::ManageUsers => "manage-users",
            Capability::ClearAll => "clear-all",
        };
        f.write_str(name)
    }
}

/// The caller's identity, passed explicitly into every service entry
/// point instead of being read from ambient state.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: Role,
    /// Distinguished application-owner flag (stable, id-based).
    pub app_owner: bool,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            app_owner: false,
        }
    }

    pub fn owner(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Admin,
            app_owner: true,
        }
    }
}

pub fn can_view(session: &Session, record_creator: &str) -> bool {
    match session.role {
        Role::Pending => false,
        Role::Officer | Role::Admin => true,
        Role::OrgOwner => session.username == record_creator,
    }
}

pub fn can_create(session: &Session) -> bool {
    matches!(session.role, Role::Officer | Role::Admin | Role::OrgOwner)
}

pub fn can_edit(session: &Session, record_creator: &str) -> bool {
    match session.role {
        Role::Pending => false,
        Role::Officer | Role::Admin => true,
        Role::OrgOwner => session.username == record_creator,
    }
}

pub fn can_delete(session: &Session) -> bool {
    matches!(session.role, Role::Officer | Role::Admin)
}

pub fn can_manage_users(session: &Session) -> bool {
    matches!(session.role, Role::Admin)
}

/// Only the distinguished application owner may wipe the store.
pub fn can_clear_all(session: &Session) -> bool {
    session.app_owner
}

/// The owner account is immutable: no role change, edit, or deletion may
/// touch it, regardless of who asks. Checked by flag, never by name.
pub fn protected_account(user: &User) -> bool {
    user.app_owner
}

/// Evaluate a predicate result into the error the caller reports.
pub fn require(granted: bool, capability: Capability) -> VigilResult<()> {
    if granted {
        Ok(())
    } else {
        Err(VigilError::PermissionDenied { capability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        Session::new("alice", role)
    }

    #[test]
    fn pending_has_no_capabilities() {
        let s = session(Role::Pending);
        assert!(!can_view(&s, "alice"));
        assert!(!can_create(&s));
        assert!(!can_edit(&s, "alice"));
        assert!(!can_delete(&s));
        assert!(!can_manage_users(&s));
        assert!(!can_clear_all(&s));
    }

    #[test]
    fn org_owner_limited_to_own_records() {
        let s = session(Role::OrgOwner);
        assert!(can_view(&s, "alice"));
        assert!(!can_view(&s, "bob"));
        assert!(can_create(&s));
        assert!(can_edit(&s, "alice"));
        assert!(!can_edit(&s, "bob"));
        assert!(!can_delete(&s));
        assert!(!can_manage_users(&s));
    }

    #[test]
    fn officer_operates_on_all_records_but_not_users() {
        let s = session(Role::Officer);
        assert!(can_view(&s, "bob"));
        assert!(can_edit(&s, "bob"));
        assert!(can_delete(&s));
        assert!(!can_manage_users(&s));
        assert!(!can_clear_all(&s));
    }

    #[test]
    fn admin_manages_users_but_cannot_clear_all() {
        let s = session(Role::Admin);
        assert!(can_manage_users(&s));
        assert!(!can_clear_all(&s));
    }

    #[test]
    fn clear_all_is_owner_only() {
        assert!(can_clear_all(&Session::owner("root")));
    }

    #[test]
    fn owner_flag_protects_the_account() {
        let mut user = User {
            id: uuid::Uuid::new_v4(),
            username: "root".into(),
            password_hash: "hash".into(),
            role: Role::Admin,
            app_owner: true,
            created_at: chrono::Utc::now(),
            last_activity: None,
        };
        assert!(protected_account(&user));
        user.app_owner = false;
        assert!(!protected_account(&user));
    }

    #[test]
    fn require_maps_to_permission_denied() {
        let err = require(false, Capability::Delete).unwrap_err();
        assert!(matches!(
            err,
            VigilError::PermissionDenied {
                capability: Capability::Delete
            }
        ));
    }
}
