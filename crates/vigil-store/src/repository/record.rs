//! SurrealDB implementation of [`RecordRepository`].
//!
//! One row per record; model fields map to `snake_case` columns, the
//! article list is an array column, and screenshots are stored as an
//! array of strings: inline data URLs verbatim, uploaded images as
//! their bucket reference. The split is reconstructed on load, so
//! callers never branch on backend identity.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::warn;
use uuid::Uuid;

use vigil_core::error::VigilResult;
use vigil_core::models::record::{CreateRecord, Record, Screenshot, UpdateRecord};
use vigil_core::repository::{ImageStore, RecordRepository, StorageUsage};

use crate::error::StoreError;
use crate::repository::SurrealImageStore;

fn screenshot_to_string(s: &Screenshot) -> String {
    match s {
        Screenshot::Inline { data } => data.clone(),
        Screenshot::Remote { url } => url.clone(),
    }
}

fn screenshot_from_string(s: String) -> Screenshot {
    if s.starts_with("data:") {
        Screenshot::Inline { data: s }
    } else {
        Screenshot::Remote { url: s }
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct RecordRow {
    individual_name: String,
    external_id: Option<String>,
    location: String,
    reason: String,
    responsible_officers: String,
    articles: Vec<String>,
    seized_items: Option<String>,
    observations: Option<String>,
    date_time: DateTime<Utc>,
    screenshots: Vec<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    edited_by: Option<String>,
    edited_at: Option<DateTime<Utc>>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct RecordRowWithId {
    record_id: String,
    individual_name: String,
    external_id: Option<String>,
    location: String,
    reason: String,
    responsible_officers: String,
    articles: Vec<String>,
    seized_items: Option<String>,
    observations: Option<String>,
    date_time: DateTime<Utc>,
    screenshots: Vec<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    edited_by: Option<String>,
    edited_at: Option<DateTime<Utc>>,
}

impl RecordRow {
    fn into_record(self, id: Uuid) -> Record {
        Record {
            id,
            individual_name: self.individual_name,
            external_id: self.external_id,
            location: self.location,
            reason: self.reason,
            responsible_officers: self.responsible_officers,
            articles: self.articles,
            seized_items: self.seized_items,
            observations: self.observations,
            date_time: self.date_time,
            screenshots: self
                .screenshots
                .into_iter()
                .map(screenshot_from_string)
                .collect(),
            created_by: self.created_by,
            created_at: self.created_at,
            edited_by: self.edited_by,
            edited_at: self.edited_at,
        }
    }
}

impl RecordRowWithId {
    fn try_into_record(self) -> Result<Record, StoreError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| StoreError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Record {
            id,
            individual_name: self.individual_name,
            external_id: self.external_id,
            location: self.location,
            reason: self.reason,
            responsible_officers: self.responsible_officers,
            articles: self.articles,
            seized_items: self.seized_items,
            observations: self.observations,
            date_time: self.date_time,
            screenshots: self
                .screenshots
                .into_iter()
                .map(screenshot_from_string)
                .collect(),
            created_by: self.created_by,
            created_at: self.created_at,
            edited_by: self.edited_by,
            edited_at: self.edited_at,
        })
    }
}

/// SurrealDB implementation of the record repository.
#[derive(Clone)]
pub struct SurrealRecordRepository<C: Connection> {
    db: Surreal<C>,
    images: SurrealImageStore<C>,
    /// Byte ceiling reported by `usage()`.
    limit_bytes: u64,
}

impl<C: Connection> SurrealRecordRepository<C> {
    pub fn new(db: Surreal<C>, limit_bytes: u64) -> Self {
        Self {
            images: SurrealImageStore::new(db.clone()),
            db,
            limit_bytes,
        }
    }

    /// Delete bucket images referenced by the record's screenshots.
    ///
    /// Failures are logged and swallowed: an interrupted delete may leave
    /// an orphaned image, which is a known non-fatal leak.
    async fn delete_images(&self, record: &Record) {
        for screenshot in &record.screenshots {
            if let Screenshot::Remote { url } = screenshot {
                if let Err(e) = self.images.delete(url).await {
                    warn!(reference = %url, error = %e, "Orphaned image left behind");
                }
            }
        }
    }
}

impl<C: Connection> RecordRepository for SurrealRecordRepository<C> {
    async fn list(&self) -> VigilResult<Vec<Record>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM record \
                 ORDER BY created_at DESC",
            )
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<RecordRowWithId> = result.take(0).map_err(StoreError::from)?;
        let records = rows
            .into_iter()
            .map(RecordRowWithId::try_into_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn get_by_id(&self, id: Uuid) -> VigilResult<Record> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('record', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<RecordRow> = result.take(0).map_err(StoreError::from)?;
        let row = rows.into_iter().next().ok_or(StoreError::NotFound {
            entity: "record".into(),
            id: id_str,
        })?;

        Ok(row.into_record(id))
    }

    async fn create(&self, input: CreateRecord) -> VigilResult<Record> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let screenshots: Vec<String> =
            input.screenshots.iter().map(screenshot_to_string).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('record', $id) SET \
                 individual_name = $individual_name, \
                 external_id = $external_id, \
                 location = $location, \
                 reason = $reason, \
                 responsible_officers = $responsible_officers, \
                 articles = $articles, \
                 seized_items = $seized_items, \
                 observations = $observations, \
                 date_time = $date_time, \
                 screenshots = $screenshots, \
                 created_by = $created_by, \
                 edited_by = NONE, \
                 edited_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("individual_name", input.individual_name))
            .bind(("external_id", input.external_id))
            .bind(("location", input.location))
            .bind(("reason", input.reason))
            .bind(("responsible_officers", input.responsible_officers))
            .bind(("articles", input.articles))
            .bind(("seized_items", input.seized_items))
            .bind(("observations", input.observations))
            .bind(("date_time", input.date_time))
            .bind(("screenshots", screenshots))
            .bind(("created_by", input.created_by))
            .await
            .map_err(StoreError::from)?;

        let mut result = result
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        let rows: Vec<RecordRow> = result.take(0).map_err(StoreError::from)?;
        let row = rows.into_iter().next().ok_or(StoreError::NotFound {
            entity: "record".into(),
            id: id_str,
        })?;

        Ok(row.into_record(id))
    }

    async fn update(&self, id: Uuid, input: UpdateRecord) -> VigilResult<Record> {
        let id_str = id.to_string();

        // Presence check first: UPDATE on a missing row is a silent no-op
        // in SurrealDB, and unknown ids must report NotFound.
        self.get_by_id(id).await?;

        let mut sets = Vec::new();
        if input.individual_name.is_some() {
            sets.push("individual_name = $individual_name");
        }
        if input.external_id.is_some() {
            sets.push("external_id = $external_id");
        }
        if input.location.is_some() {
            sets.push("location = $location");
        }
        if input.reason.is_some() {
            sets.push("reason = $reason");
        }
        if input.responsible_officers.is_some() {
            sets.push("responsible_officers = $responsible_officers");
        }
        if input.articles.is_some() {
            sets.push("articles = $articles");
        }
        if input.seized_items.is_some() {
            sets.push("seized_items = $seized_items");
        }
        if input.observations.is_some() {
            sets.push("observations = $observations");
        }
        if input.date_time.is_some() {
            sets.push("date_time = $date_time");
        }
        if input.screenshots.is_some() {
            sets.push("screenshots = $screenshots");
        }
        sets.push("edited_by = $edited_by");
        sets.push("edited_at = time::now()");

        let query = format!(
            "UPDATE type::record('record', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("edited_by", input.edited_by));

        if let Some(individual_name) = input.individual_name {
            builder = builder.bind(("individual_name", individual_name));
        }
        if let Some(external_id) = input.external_id {
            // Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("external_id", external_id));
        }
        if let Some(location) = input.location {
            builder = builder.bind(("location", location));
        }
        if let Some(reason) = input.reason {
            builder = builder.bind(("reason", reason));
        }
        if let Some(responsible_officers) = input.responsible_officers {
            builder = builder.bind(("responsible_officers", responsible_officers));
        }
        if let Some(articles) = input.articles {
            builder = builder.bind(("articles", articles));
        }
        if let Some(seized_items) = input.seized_items {
            builder = builder.bind(("seized_items", seized_items));
        }
        if let Some(observations) = input.observations {
            builder = builder.bind(("observations", observations));
        }
        if let Some(date_time) = input.date_time {
            builder = builder.bind(("date_time", date_time));
        }
        if let Some(screenshots) = input.screenshots {
            let screenshots: Vec<String> =
                screenshots.iter().map(screenshot_to_string).collect();
            builder = builder.bind(("screenshots", screenshots));
        }

        let result = builder.await.map_err(StoreError::from)?;
        let mut result = result
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        let rows: Vec<RecordRow> = result.take(0).map_err(StoreError::from)?;
        let row = rows.into_iter().next().ok_or(StoreError::NotFound {
            entity: "record".into(),
            id: id_str,
        })?;

        Ok(row.into_record(id))
    }

    async fn delete(&self, id: Uuid) -> VigilResult<Option<Record>> {
        // Snapshot first (audit log needs the deleted row), images next,
        // row last. An interruption between the image and row deletes
        // leaves an orphaned image, not a dangling reference.
        let record = match self.get_by_id(id).await {
            Ok(record) => record,
            Err(vigil_core::VigilError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        self.delete_images(&record).await;

        self.db
            .query("DELETE type::record('record', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(StoreError::from)?
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(Some(record))
    }

    async fn clear_all(&self) -> VigilResult<u64> {
        let records = self.list().await?;

        for record in &records {
            self.delete_images(record).await;
        }

        self.db
            .query("DELETE record")
            .await
            .map_err(StoreError::from)?
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(records.len() as u64)
    }

    async fn list_by_individual(&self, name: &str) -> VigilResult<Vec<Record>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM record \
                 WHERE string::lowercase(individual_name) = \
                 string::lowercase($name) \
                 ORDER BY created_at DESC",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<RecordRowWithId> = result.take(0).map_err(StoreError::from)?;
        let records = rows
            .into_iter()
            .map(RecordRowWithId::try_into_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn usage(&self) -> VigilResult<StorageUsage> {
        // Stored objects dominate utilization on this backend; row text
        // is negligible next to the image bucket.
        let used_bytes = self.images.total_bytes().await?;
        Ok(StorageUsage {
            used_bytes,
            limit_bytes: self.limit_bytes,
        })
    }
}
