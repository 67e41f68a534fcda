//! User management flows: registration, approval, role changes, and
//! removal. Remote backend only; the local store carries no accounts.

use tracing::{info, warn};
use uuid::Uuid;

use vigil_core::authz::{self, Capability, Session};
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::audit::{AuditAction, CreateAuditLogEntry};
use vigil_core::models::user::{CreateUser, Role, User};
use vigil_core::repository::{AuditLogRepository, UserRepository};

/// Account lifecycle over the user repository. Every mutation is gated
/// on the manage-users capability and refuses to touch the application
/// owner account.
pub struct UserService<U, A>
where
    U: UserRepository,
    A: AuditLogRepository,
{
    users: U,
    audit: A,
}

impl<U, A> UserService<U, A>
where
    U: UserRepository,
    A: AuditLogRepository,
{
    pub fn new(users: U, audit: A) -> Self {
        Self { users, audit }
    }

    /// Self-service registration. The account lands as `Pending` with no
    /// capabilities until an admin approves it.
    pub async fn register(&self, username: &str, password: &str) -> VigilResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(VigilError::Validation {
                message: "username must not be empty".into(),
            });
        }
        if password.is_empty() {
            return Err(VigilError::Validation {
                message: "password must not be empty".into(),
            });
        }

        let user = self
            .users
            .create(CreateUser {
                username: username.to_string(),
                password: password.to_string(),
                role: Role::Pending,
                app_owner: false,
            })
            .await?;
        info!(username = %user.username, "Account registered, awaiting approval");
        Ok(user)
    }

    /// Approve a pending account into an operational role.
    pub async fn approve(&self, session: &Session, id: Uuid, role: Role) -> VigilResult<User> {
        authz::require(authz::can_manage_users(session), Capability::ManageUsers)?;
        if role == Role::Pending {
            return Err(VigilError::Validation {
                message: "cannot approve an account into the pending role".into(),
            });
        }

        let target = self.users.get_by_id(id).await?;
        self.guard_owner(&target)?;

        let user = self.users.set_role(id, role).await?;
        self.append_role_change(session, &user, "approved").await?;
        info!(username = %user.username, role = ?role, by = %session.username, "Account approved");
        Ok(user)
    }

    /// Reject a pending account, deleting it outright.
    pub async fn reject(&self, session: &Session, id: Uuid) -> VigilResult<()> {
        authz::require(authz::can_manage_users(session), Capability::ManageUsers)?;

        let target = self.users.get_by_id(id).await?;
        self.guard_owner(&target)?;
        if target.role != Role::Pending {
            return Err(VigilError::Validation {
                message: format!("account {} is not pending approval", target.username),
            });
        }

        self.users.delete(id).await?;
        self.append_removal(session, &target, "rejected").await?;
        info!(username = %target.username, by = %session.username, "Pending account rejected");
        Ok(())
    }

    /// Change the role of an active account.
    pub async fn change_role(
        &self,
        session: &Session,
        id: Uuid,
        role: Role,
    ) -> VigilResult<User> {
        authz::require(authz::can_manage_users(session), Capability::ManageUsers)?;

        let target = self.users.get_by_id(id).await?;
        self.guard_owner(&target)?;

        let user = self.users.set_role(id, role).await?;
        self.append_role_change(session, &user, "role changed").await?;
        info!(username = %user.username, role = ?role, by = %session.username, "Role changed");
        Ok(user)
    }

    /// Remove an account entirely.
    pub async fn remove(&self, session: &Session, id: Uuid) -> VigilResult<()> {
        authz::require(authz::can_manage_users(session), Capability::ManageUsers)?;

        let target = self.users.get_by_id(id).await?;
        self.guard_owner(&target)?;

        self.users.delete(id).await?;
        self.append_removal(session, &target, "removed").await?;
        warn!(username = %target.username, by = %session.username, "Account removed");
        Ok(())
    }

    /// Approved accounts, for the admin roster view.
    pub async fn list_active(&self, session: &Session) -> VigilResult<Vec<User>> {
        authz::require(authz::can_manage_users(session), Capability::ManageUsers)?;
        self.users.list_active().await
    }

    /// Accounts awaiting approval.
    pub async fn list_pending(&self, session: &Session) -> VigilResult<Vec<User>> {
        authz::require(authz::can_manage_users(session), Capability::ManageUsers)?;
        self.users.list_pending().await
    }

    /// The owner account is immutable through this service, no matter
    /// who asks.
    fn guard_owner(&self, target: &User) -> VigilResult<()> {
        if authz::protected_account(target) {
            return Err(VigilError::PermissionDenied {
                capability: Capability::ManageUsers,
            });
        }
        Ok(())
    }

    async fn append_role_change(
        &self,
        session: &Session,
        user: &User,
        what: &str,
    ) -> VigilResult<()> {
        self.audit
            .append(CreateAuditLogEntry {
                action: AuditAction::RoleChange,
                performed_by: session.username.clone(),
                target_user: Some(user.username.clone()),
                target_record: None,
                details: format!("{what}: {} is now {:?}", user.username, user.role),
            })
            .await?;
        Ok(())
    }

    async fn append_removal(
        &self,
        session: &Session,
        user: &User,
        what: &str,
    ) -> VigilResult<()> {
        self.audit
            .append(CreateAuditLogEntry {
                action: AuditAction::UserRemoval,
                performed_by: session.username.clone(),
                target_user: Some(user.username.clone()),
                target_record: None,
                details: format!("{what}: {}", user.username),
            })
            .await?;
        Ok(())
    }
}
