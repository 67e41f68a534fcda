//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Both storage backends implement
//! the same contract; callers never branch on backend identity.

use uuid::Uuid;

use crate::error::VigilResult;
use crate::models::{
    audit::{AuditLogEntry, CreateAuditLogEntry},
    record::{CreateRecord, Record, UpdateRecord},
    settings::Settings,
    user::{CreateUser, Role, User},
};

/// Byte estimate of backend utilization, for the quota monitor.
#[derive(Debug, Clone, Copy)]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub limit_bytes: u64,
}

impl StorageUsage {
    pub fn percent(&self) -> f64 {
        if self.limit_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.limit_bytes as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

pub trait RecordRepository: Send + Sync {
    /// All records, newest first by `created_at`.
    fn list(&self) -> impl Future<Output = VigilResult<Vec<Record>>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VigilResult<Record>> + Send;

    fn create(&self, input: CreateRecord) -> impl Future<Output = VigilResult<Record>> + Send;

    /// Partial merge: fields absent from the input are left untouched.
    /// Unknown id reports `NotFound` without touching anything.
    fn update(
        &self,
        id: Uuid,
        input: UpdateRecord,
    ) -> impl Future<Output = VigilResult<Record>> + Send;

    /// Returns the deleted record (for audit snapshotting), or `None`
    /// if the id was unknown. The remote backend deletes backend-resident
    /// images first; an interruption may leak an orphaned image, which is
    /// logged and tolerated.
    fn delete(&self, id: Uuid) -> impl Future<Output = VigilResult<Option<Record>>> + Send;

    /// Deletes every record and every associated image. The service layer
    /// gates this to the application owner.
    fn clear_all(&self) -> impl Future<Output = VigilResult<u64>> + Send;

    /// Case-insensitive exact match on `individual_name`, newest first.
    fn list_by_individual(
        &self,
        name: &str,
    ) -> impl Future<Output = VigilResult<Vec<Record>>> + Send;

    fn usage(&self) -> impl Future<Output = VigilResult<StorageUsage>> + Send;
}

// ---------------------------------------------------------------------------
// Images (remote backend only)
// ---------------------------------------------------------------------------

/// Binary object bucket for screenshots on the remote backend.
pub trait ImageStore: Send + Sync {
    /// Store `bytes` under a globally unique `filename`; returns the
    /// stable reference recorded in `Screenshot::Remote`.
    fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = VigilResult<String>> + Send;

    fn fetch(&self, reference: &str) -> impl Future<Output = VigilResult<Vec<u8>>> + Send;

    fn delete(&self, reference: &str) -> impl Future<Output = VigilResult<()>> + Send;

    /// Sum of stored object sizes, for the quota monitor.
    fn total_bytes(&self) -> impl Future<Output = VigilResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Users (remote backend only)
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = VigilResult<User>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VigilResult<User>> + Send;

    fn get_by_username(&self, username: &str)
    -> impl Future<Output = VigilResult<User>> + Send;

    /// Approved accounts only; `Pending` users never appear here.
    fn list_active(&self) -> impl Future<Output = VigilResult<Vec<User>>> + Send;

    fn list_pending(&self) -> impl Future<Output = VigilResult<Vec<User>>> + Send;

    fn set_role(&self, id: Uuid, role: Role) -> impl Future<Output = VigilResult<User>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = VigilResult<()>> + Send;

    fn touch_activity(&self, id: Uuid) -> impl Future<Output = VigilResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Audit log (append-only)
// ---------------------------------------------------------------------------

pub trait AuditLogRepository: Send + Sync {
    /// Append a new entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = VigilResult<AuditLogEntry>> + Send;

    /// Newest first, at most `limit` entries.
    fn list(&self, limit: usize) -> impl Future<Output = VigilResult<Vec<AuditLogEntry>>> + Send;
}

// ---------------------------------------------------------------------------
// Settings (single object)
// ---------------------------------------------------------------------------

pub trait SettingsRepository: Send + Sync {
    /// Loads the settings object, falling back to defaults when none
    /// has been saved yet.
    fn load(&self) -> impl Future<Output = VigilResult<Settings>> + Send;

    fn save(&self, settings: Settings) -> impl Future<Output = VigilResult<()>> + Send;
}
