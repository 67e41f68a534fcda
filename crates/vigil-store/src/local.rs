//! Local single-blob backend.
//!
//! The entire store lives in one JSON file with three named entries:
//! the record collection (newest first), the settings object, and a
//! capped audit log. Every mutation reads the whole blob, mutates it in
//! memory, and atomically rewrites it (temp file + rename). A byte
//! ceiling applies to the serialized blob; a write that would exceed it
//! fails with a quota error and leaves the file untouched.
//!
//! Mutations hold a process-level mutex for the read-modify-rewrite
//! window; the mutex lives behind an `Arc`, so every clone of one store
//! serializes on the same lock. Concurrent mutation from another
//! process can still lose updates; this backend has no compare-and-swap.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use vigil_core::error::VigilResult;
use vigil_core::models::audit::{AuditLogEntry, CreateAuditLogEntry};
use vigil_core::models::record::{CreateRecord, Record, Screenshot, UpdateRecord};
use vigil_core::models::settings::Settings;
use vigil_core::repository::{
    AuditLogRepository, RecordRepository, SettingsRepository, StorageUsage,
};

use crate::error::StoreError;

const BLOB_VERSION: u32 = 2;

/// Configuration for the local blob store.
#[derive(Debug, Clone)]
pub struct LocalStoreConfig {
    /// Path of the blob file.
    pub path: PathBuf,
    /// Byte ceiling for the serialized blob (default: 5 MiB).
    pub limit_bytes: u64,
    /// Maximum retained audit entries (default: 500, newest kept).
    pub audit_cap: usize,
}

impl LocalStoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            limit_bytes: 5 * 1024 * 1024,
            audit_cap: 500,
        }
    }
}

/// Stored record shape, tolerant of the legacy schema.
///
/// Early blobs carried a single `article` string; current blobs carry
/// an ordered `articles` list. Translation happens here so callers only
/// ever see the canonical model.
#[derive(Debug, Serialize, Deserialize)]
struct BlobRecord {
    id: Uuid,
    individual_name: String,
    #[serde(default)]
    external_id: Option<String>,
    location: String,
    reason: String,
    responsible_officers: String,
    #[serde(default)]
    articles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    article: Option<String>,
    #[serde(default)]
    seized_items: Option<String>,
    #[serde(default)]
    observations: Option<String>,
    date_time: chrono::DateTime<Utc>,
    #[serde(default)]
    screenshots: Vec<Screenshot>,
    created_by: String,
    created_at: chrono::DateTime<Utc>,
    #[serde(default)]
    edited_by: Option<String>,
    #[serde(default)]
    edited_at: Option<chrono::DateTime<Utc>>,
}

impl BlobRecord {
    fn into_record(self) -> Record {
        let articles = if self.articles.is_empty() {
            self.article.into_iter().collect()
        } else {
            self.articles
        };
        Record {
            id: self.id,
            individual_name: self.individual_name,
            external_id: self.external_id,
            location: self.location,
            reason: self.reason,
            responsible_officers: self.responsible_officers,
            articles,
            seized_items: self.seized_items,
            observations: self.observations,
            date_time: self.date_time,
            screenshots: self.screenshots,
            created_by: self.created_by,
            created_at: self.created_at,
            edited_by: self.edited_by,
            edited_at: self.edited_at,
        }
    }

    fn from_record(record: Record) -> Self {
        Self {
            id: record.id,
            individual_name: record.individual_name,
            external_id: record.external_id,
            location: record.location,
            reason: record.reason,
            responsible_officers: record.responsible_officers,
            articles: record.articles,
            article: None,
            seized_items: record.seized_items,
            observations: record.observations,
            date_time: record.date_time,
            screenshots: record.screenshots,
            created_by: record.created_by,
            created_at: record.created_at,
            edited_by: record.edited_by,
            edited_at: record.edited_at,
        }
    }
}

/// The three named entries of the blob file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Blob {
    version: u32,
    /// Newest first.
    records: Vec<BlobRecord>,
    settings: Option<Settings>,
    /// Newest first, capped.
    audit_log: Vec<AuditLogEntry>,
}

/// Local single-blob store. Implements the record, audit-log, and
/// settings repositories; the local variant keeps no user table.
///
/// Cheap to clone: clones share the blob path, the quota config, and
/// the write lock, so any mix of clones mutating the same file is
/// serialized.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<Inner>,
}

struct Inner {
    config: LocalStoreConfig,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(config: LocalStoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                write_lock: Mutex::new(()),
            }),
        }
    }

    async fn read_blob(&self) -> Result<Blob, StoreError> {
        match tokio::fs::read(&self.inner.config.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Blob {
                version: BLOB_VERSION,
                ..Default::default()
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Serialize and atomically replace the blob file. The quota check
    /// happens before any byte reaches disk, so a rejected write leaves
    /// the previous blob intact.
    async fn write_blob(&self, blob: &Blob) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(blob)?;
        if bytes.len() as u64 > self.inner.config.limit_bytes {
            return Err(StoreError::QuotaExceeded {
                used_bytes: bytes.len() as u64,
                limit_bytes: self.inner.config.limit_bytes,
            });
        }

        let tmp = self.inner.config.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.inner.config.path).await?;
        Ok(())
    }
}

impl RecordRepository for LocalStore {
    async fn list(&self) -> VigilResult<Vec<Record>> {
        let blob = self.read_blob().await?;
        let mut records: Vec<Record> = blob
            .records
            .into_iter()
            .map(BlobRecord::into_record)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn get_by_id(&self, id: Uuid) -> VigilResult<Record> {
        let blob = self.read_blob().await?;
        blob.records
            .into_iter()
            .find(|r| r.id == id)
            .map(BlobRecord::into_record)
            .ok_or_else(|| {
                StoreError::NotFound {
                    entity: "record".into(),
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn create(&self, input: CreateRecord) -> VigilResult<Record> {
        let _guard = self.inner.write_lock.lock().await;

        let record = Record {
            id: Uuid::new_v4(),
            individual_name: input.individual_name,
            external_id: input.external_id,
            location: input.location,
            reason: input.reason,
            responsible_officers: input.responsible_officers,
            articles: input.articles,
            seized_items: input.seized_items,
            observations: input.observations,
            date_time: input.date_time,
            screenshots: input.screenshots,
            created_by: input.created_by,
            created_at: Utc::now(),
            edited_by: None,
            edited_at: None,
        };

        let mut blob = self.read_blob().await?;
        blob.records.insert(0, BlobRecord::from_record(record.clone()));
        self.write_blob(&blob).await?;

        Ok(record)
    }

    async fn update(&self, id: Uuid, input: UpdateRecord) -> VigilResult<Record> {
        let _guard = self.inner.write_lock.lock().await;

        let mut blob = self.read_blob().await?;
        let position = blob.records.iter().position(|r| r.id == id).ok_or_else(|| {
            StoreError::NotFound {
                entity: "record".into(),
                id: id.to_string(),
            }
        })?;

        let mut record = blob.records.remove(position).into_record();
        if let Some(individual_name) = input.individual_name {
            record.individual_name = individual_name;
        }
        if let Some(external_id) = input.external_id {
            record.external_id = external_id;
        }
        if let Some(location) = input.location {
            record.location = location;
        }
        if let Some(reason) = input.reason {
            record.reason = reason;
        }
        if let Some(responsible_officers) = input.responsible_officers {
            record.responsible_officers = responsible_officers;
        }
        if let Some(articles) = input.articles {
            record.articles = articles;
        }
        if let Some(seized_items) = input.seized_items {
            record.seized_items = seized_items;
        }
        if let Some(observations) = input.observations {
            record.observations = observations;
        }
        if let Some(date_time) = input.date_time {
            record.date_time = date_time;
        }
        if let Some(screenshots) = input.screenshots {
            record.screenshots = screenshots;
        }
        record.edited_by = Some(input.edited_by);
        record.edited_at = Some(Utc::now());

        blob.records
            .insert(position, BlobRecord::from_record(record.clone()));
        self.write_blob(&blob).await?;

        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> VigilResult<Option<Record>> {
        let _guard = self.inner.write_lock.lock().await;

        let mut blob = self.read_blob().await?;
        let Some(position) = blob.records.iter().position(|r| r.id == id) else {
            return Ok(None);
        };

        let removed = blob.records.remove(position).into_record();
        self.write_blob(&blob).await?;

        Ok(Some(removed))
    }

    async fn clear_all(&self) -> VigilResult<u64> {
        let _guard = self.inner.write_lock.lock().await;

        let mut blob = self.read_blob().await?;
        let removed = blob.records.len() as u64;
        blob.records.clear();
        self.write_blob(&blob).await?;

        Ok(removed)
    }

    async fn list_by_individual(&self, name: &str) -> VigilResult<Vec<Record>> {
        let needle = name.to_lowercase();
        let mut records: Vec<Record> = RecordRepository::list(self)
            .await?
            .into_iter()
            .filter(|r| r.individual_name.to_lowercase() == needle)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn usage(&self) -> VigilResult<StorageUsage> {
        let used_bytes = match tokio::fs::metadata(&self.inner.config.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(StoreError::from(e).into()),
        };
        Ok(StorageUsage {
            used_bytes,
            limit_bytes: self.inner.config.limit_bytes,
        })
    }
}

impl AuditLogRepository for LocalStore {
    async fn append(&self, input: CreateAuditLogEntry) -> VigilResult<AuditLogEntry> {
        let _guard = self.inner.write_lock.lock().await;

        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            action: input.action,
            performed_by: input.performed_by,
            target_user: input.target_user,
            target_record: input.target_record,
            details: input.details,
            timestamp: Utc::now(),
        };

        let mut blob = self.read_blob().await?;
        blob.audit_log.insert(0, entry.clone());
        blob.audit_log.truncate(self.inner.config.audit_cap);
        self.write_blob(&blob).await?;

        Ok(entry)
    }

    async fn list(&self, limit: usize) -> VigilResult<Vec<AuditLogEntry>> {
        let blob = self.read_blob().await?;
        Ok(blob.audit_log.into_iter().take(limit).collect())
    }
}

impl SettingsRepository for LocalStore {
    async fn load(&self) -> VigilResult<Settings> {
        let blob = self.read_blob().await?;
        Ok(blob.settings.unwrap_or_default())
    }

    async fn save(&self, settings: Settings) -> VigilResult<()> {
        let _guard = self.inner.write_lock.lock().await;

        let mut blob = self.read_blob().await?;
        blob.settings = Some(settings);
        self.write_blob(&blob).await?;
        Ok(())
    }
}
