//! Audit log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditAction {
    RecordCreate,
    RecordEdit,
    RecordDelete,
    RoleChange,
    UserRemoval,
    ClearAll,
}

/// Immutable entry describing one privileged action. Append-only: no
/// update or delete path exists through normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub performed_by: String,
    pub target_user: Option<String>,
    /// Snapshot of the affected record, taken before deletion.
    pub target_record: Option<serde_json::Value>,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    pub action: AuditAction,
    pub performed_by: String,
    pub target_user: Option<String>,
    pub target_record: Option<serde_json::Value>,
    pub details: String,
}
