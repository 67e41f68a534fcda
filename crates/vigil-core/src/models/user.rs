//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed role enumeration. `Pending` accounts have no capabilities and
/// are excluded from active-user listings until approved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Pending,
    /// Broadest operational rights over records.
    Officer,
    Admin,
    /// May view and edit only records it authored.
    OrgOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique, case-sensitive.
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    /// The distinguished application-owner account. Checked by this flag,
    /// not by display name; exactly one account should carry it. No one,
    /// including admins, may edit, demote, or delete that account.
    pub app_owner: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    /// Raw password; hashed with Argon2id by the storage layer.
    pub password: String,
    /// New accounts normally start as `Pending` awaiting approval.
    pub role: Role,
    pub app_owner: bool,
}
