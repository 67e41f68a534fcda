//! Incident record domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One piece of photographic evidence attached to a record.
///
/// The local backend keeps images inline as data URLs; the remote backend
/// uploads them and stores a stable reference instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Screenshot {
    /// Base64 data URL (`data:image/jpeg;base64,…`).
    Inline { data: String },
    /// Backend-resident object, addressed by its upload reference.
    Remote { url: String },
}

/// One logged incident.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: Uuid,
    /// Natural grouping key; matched case-insensitively.
    pub individual_name: String,
    /// Secondary identifier for the individual (later schema only).
    pub external_id: Option<String>,
    pub location: String,
    pub reason: String,
    pub responsible_officers: String,
    /// Ordered classification tags. The legacy schema stored a single
    /// value; the storage adapters translate it on load.
    pub articles: Vec<String>,
    pub seized_items: Option<String>,
    pub observations: Option<String>,
    /// When the incident happened, distinct from `created_at`.
    pub date_time: DateTime<Utc>,
    pub screenshots: Vec<Screenshot>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// Present iff at least one edit occurred.
    pub edited_by: Option<String>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// Input for the record create flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecord {
    pub individual_name: String,
    pub external_id: Option<String>,
    pub location: String,
    pub reason: String,
    pub responsible_officers: String,
    pub articles: Vec<String>,
    pub seized_items: Option<String>,
    pub observations: Option<String>,
    pub date_time: DateTime<Utc>,
    pub screenshots: Vec<Screenshot>,
    pub created_by: String,
}

/// Partial update: fields left as `None` are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub individual_name: Option<String>,
    pub external_id: Option<Option<String>>,
    pub location: Option<String>,
    pub reason: Option<String>,
    pub responsible_officers: Option<String>,
    pub articles: Option<Vec<String>>,
    pub seized_items: Option<Option<String>>,
    pub observations: Option<Option<String>>,
    pub date_time: Option<DateTime<Utc>>,
    pub screenshots: Option<Vec<Screenshot>>,
    /// Username performing the edit; sets `edited_by`/`edited_at`.
    pub edited_by: String,
}
