//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! Append-only: the table's schema denies UPDATE and DELETE, and this
//! repository exposes neither.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use vigil_core::error::VigilResult;
use vigil_core::models::audit::{AuditAction, AuditLogEntry, CreateAuditLogEntry};
use vigil_core::repository::AuditLogRepository;

use crate::error::StoreError;

fn parse_action(s: &str) -> Result<AuditAction, StoreError> {
    match s {
        "RecordCreate" => Ok(AuditAction::RecordCreate),
        "RecordEdit" => Ok(AuditAction::RecordEdit),
        "RecordDelete" => Ok(AuditAction::RecordDelete),
        "RoleChange" => Ok(AuditAction::RoleChange),
        "UserRemoval" => Ok(AuditAction::UserRemoval),
        "ClearAll" => Ok(AuditAction::ClearAll),
        other => Err(StoreError::Migration(format!("unknown audit action: {other}"))),
    }
}

fn action_to_string(action: AuditAction) -> &'static str {
    match action {
        AuditAction::RecordCreate => "RecordCreate",
        AuditAction::RecordEdit => "RecordEdit",
        AuditAction::RecordDelete => "RecordDelete",
        AuditAction::RoleChange => "RoleChange",
        AuditAction::UserRemoval => "UserRemoval",
        AuditAction::ClearAll => "ClearAll",
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    action: String,
    performed_by: String,
    target_user: Option<String>,
    target_record: Option<String>,
    details: String,
    timestamp: DateTime<Utc>,
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditLogEntry, StoreError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| StoreError::Migration(format!("invalid UUID: {e}")))?;
        let target_record = self
            .target_record
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| StoreError::Migration(format!("corrupt record snapshot: {e}")))?;
        Ok(AuditLogEntry {
            id,
            action: parse_action(&self.action)?,
            performed_by: self.performed_by,
            target_user: self.target_user,
            target_record,
            details: self.details,
            timestamp: self.timestamp,
        })
    }
}

/// SurrealDB implementation of the audit log repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> VigilResult<AuditLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // Snapshots are stored as serialized JSON text so the audit table
        // stays SCHEMAFULL regardless of record shape changes.
        let target_record_json = input
            .target_record
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StoreError::from)?;

        self.db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 action = $action, \
                 performed_by = $performed_by, \
                 target_user = $target_user, \
                 target_record = $target_record, \
                 details = $details",
            )
            .bind(("id", id_str))
            .bind(("action", action_to_string(input.action).to_string()))
            .bind(("performed_by", input.performed_by.clone()))
            .bind(("target_user", input.target_user.clone()))
            .bind(("target_record", target_record_json))
            .bind(("details", input.details.clone()))
            .await
            .map_err(StoreError::from)?
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(AuditLogEntry {
            id,
            action: input.action,
            performed_by: input.performed_by,
            target_user: input.target_user,
            target_record: input.target_record,
            details: input.details,
            timestamp: Utc::now(),
        })
    }

    async fn list(&self, limit: usize) -> VigilResult<Vec<AuditLogEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM audit_log \
                 ORDER BY timestamp DESC LIMIT $limit",
            )
            .bind(("limit", limit as u64))
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<AuditRowWithId> = result.take(0).map_err(StoreError::from)?;
        let entries = rows
            .into_iter()
            .map(AuditRowWithId::try_into_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
