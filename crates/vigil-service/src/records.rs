//! Record flows: gated submission, edit, delete, clear-all, and the
//! read-side aggregation and quota views.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use vigil_core::authz::{self, Capability, Session};
use vigil_core::error::{VigilError, VigilResult};
use vigil_core::models::audit::{AuditAction, AuditLogEntry, CreateAuditLogEntry};
use vigil_core::models::record::{CreateRecord, Record, Screenshot, UpdateRecord};
use vigil_core::models::settings::Settings;
use vigil_core::models::user::Role;
use vigil_core::repository::{
    AuditLogRepository, ImageStore, RecordRepository, SettingsRepository,
};
use vigil_core::views::{IndividualGroup, aggregate_by_individual};
use vigil_media::{NormalizedImage, normalize_data_url, parse_data_url, sniff_content_type};
use vigil_notify::{Attachment, MessageContext, WebhookDispatcher, render_template};

use crate::config::ServiceConfig;
use crate::outcome::{SinkReport, SubmitOutcome, classify};
use crate::quota::{QuotaStatus, evaluate};

/// Input for the record submission flow. Screenshots arrive as data
/// URLs from the form layer.
#[derive(Debug, Clone)]
pub struct SubmitRecordInput {
    pub individual_name: String,
    pub external_id: Option<String>,
    pub location: String,
    pub reason: String,
    pub responsible_officers: String,
    pub articles: Vec<String>,
    pub seized_items: Option<String>,
    pub observations: Option<String>,
    pub date_time: DateTime<Utc>,
    pub screenshots: Vec<String>,
}

/// Partial input for the edit flow; `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct EditRecordInput {
    pub individual_name: Option<String>,
    pub external_id: Option<Option<String>>,
    pub location: Option<String>,
    pub reason: Option<String>,
    pub responsible_officers: Option<String>,
    pub articles: Option<Vec<String>>,
    pub seized_items: Option<Option<String>>,
    pub observations: Option<Option<String>>,
    pub date_time: Option<DateTime<Utc>>,
    /// Replacement screenshots as data URLs.
    pub screenshots: Option<Vec<String>>,
}

/// Placeholder image store for backends that keep screenshots inline.
/// Never invoked; the service only calls an image store it was
/// constructed with.
pub struct NoImageStore;

impl ImageStore for NoImageStore {
    async fn upload(&self, _: &str, _: &str, _: Vec<u8>) -> VigilResult<String> {
        Err(VigilError::Internal("no image store configured".into()))
    }

    async fn fetch(&self, _: &str) -> VigilResult<Vec<u8>> {
        Err(VigilError::Internal("no image store configured".into()))
    }

    async fn delete(&self, _: &str) -> VigilResult<()> {
        Err(VigilError::Internal("no image store configured".into()))
    }

    async fn total_bytes(&self) -> VigilResult<u64> {
        Err(VigilError::Internal("no image store configured".into()))
    }
}

/// Orchestrates the record pipeline over whatever backend implements
/// the repository traits.
///
/// Generic over repository implementations so the service layer has no
/// dependency on either storage crate.
pub struct RecordService<R, A, S, I = NoImageStore>
where
    R: RecordRepository,
    A: AuditLogRepository,
    S: SettingsRepository,
    I: ImageStore,
{
    records: R,
    audit: A,
    settings: S,
    images: Option<I>,
    dispatcher: WebhookDispatcher,
    config: ServiceConfig,
}

impl<R, A, S> RecordService<R, A, S, NoImageStore>
where
    R: RecordRepository,
    A: AuditLogRepository,
    S: SettingsRepository,
{
    /// Service over a backend that keeps screenshots inline (the local
    /// blob store).
    pub fn new(records: R, audit: A, settings: S, config: ServiceConfig) -> Self {
        Self {
            records,
            audit,
            settings,
            images: None,
            dispatcher: WebhookDispatcher::new(),
            config,
        }
    }
}

impl<R, A, S, I> RecordService<R, A, S, I>
where
    R: RecordRepository,
    A: AuditLogRepository,
    S: SettingsRepository,
    I: ImageStore,
{
    /// Service over a backend with a binary image bucket (the remote
    /// store): screenshots are uploaded and stored as references.
    pub fn with_image_store(
        records: R,
        audit: A,
        settings: S,
        images: I,
        config: ServiceConfig,
    ) -> Self {
        Self {
            records,
            audit,
            settings,
            images: Some(images),
            dispatcher: WebhookDispatcher::new(),
            config,
        }
    }

    // -------------------------------------------------------------------
    // Submission
    // -------------------------------------------------------------------

    /// Submit a new record to both sinks.
    ///
    /// Validation and permission failures resolve here, before any side
    /// effect. Afterwards the storage write and the webhook dispatch run
    /// concurrently and independently; the pair of results is classified
    /// into the three-way [`SubmitOutcome`].
    pub async fn submit_record(
        &self,
        session: &Session,
        input: SubmitRecordInput,
    ) -> VigilResult<SubmitOutcome> {
        // 1. Validate required fields.
        validate_submission(&input)?;

        // 2. Capability gate, before any side effect.
        authz::require(authz::can_create(session), Capability::Create)?;

        let mut warnings = Vec::new();

        // 3. Quota check: warn (not reject) near the ceiling; the write
        //    itself fails with a quota error at the ceiling.
        match self.records.usage().await {
            Ok(usage) => {
                if let Some(w) = evaluate(usage, self.config.quota_warn_percent).warning {
                    warn!(used = usage.used_bytes, limit = usage.limit_bytes, "{w}");
                    warnings.push(w);
                }
            }
            Err(e) => warn!(error = %e, "Quota estimate unavailable"),
        }

        // 4. Normalize every screenshot before either sink sees it.
        let normalized = self.normalize_screenshots(input.screenshots.clone()).await?;

        let settings = self.settings.load().await.unwrap_or_default();
        let message = render_template(
            &settings.message_template,
            &MessageContext {
                individual_name: input.individual_name.clone(),
                date_time: input.date_time,
                location: input.location.clone(),
                reason: input.reason.clone(),
                seized_items: input.seized_items.clone(),
                responsible_officers: input.responsible_officers.clone(),
                created_by: session.username.clone(),
                articles: input.articles.clone(),
                observations: input.observations.clone(),
            },
        );
        let attachments: Vec<Attachment> = normalized
            .iter()
            .enumerate()
            .map(|(index, img)| Attachment {
                filename: format!("screenshot{index}.jpg"),
                content_type: img.content_type.clone(),
                bytes: img.bytes.clone(),
            })
            .collect();

        // 5. Two independent sinks, joined; neither blocks the other.
        let storage_fut = async {
            let screenshots = self.store_screenshots(&normalized).await?;
            self.records
                .create(CreateRecord {
                    individual_name: input.individual_name.clone(),
                    external_id: input.external_id.clone(),
                    location: input.location.clone(),
                    reason: input.reason.clone(),
                    responsible_officers: input.responsible_officers.clone(),
                    articles: input.articles.clone(),
                    seized_items: input.seized_items.clone(),
                    observations: input.observations.clone(),
                    date_time: input.date_time,
                    screenshots,
                    created_by: session.username.clone(),
                })
                .await
        };
        let notify_fut = async {
            match settings.webhook_url.as_deref() {
                Some(url) => Some(
                    self.dispatcher
                        .send(url, &message, attachments)
                        .await
                        .map_err(VigilError::from),
                ),
                None => None,
            }
        };
        let (storage_result, notify_result) = tokio::join!(storage_fut, notify_fut);

        // 6. Classify the pair of outcomes.
        let (storage, record) = match storage_result {
            Ok(record) => (SinkReport::Succeeded, Some(record)),
            Err(e) => {
                error!(error = %e, "Storage sink failed");
                (SinkReport::Failed(e), None)
            }
        };
        let notification = match notify_result {
            None => SinkReport::Skipped,
            Some(Ok(())) => SinkReport::Succeeded,
            Some(Err(e)) => {
                warn!(error = %e, "Notification sink failed");
                SinkReport::Failed(e)
            }
        };
        if let Some(e) = storage.error() {
            warnings.push(format!("storage failed: {e}"));
        }
        if let Some(e) = notification.error() {
            warnings.push(format!("notification failed: {e}"));
        }
        let status = classify(&storage, &notification);

        // 7. Audit trail, once the record actually persisted.
        if let Some(record) = &record {
            if let Err(e) = self.append_audit(session, AuditAction::RecordCreate, record).await
            {
                error!(error = %e, "Audit append failed after create");
                warnings.push(format!("audit log append failed: {e}"));
            }
            info!(id = %record.id, by = %session.username, "Record created");
        }

        Ok(SubmitOutcome {
            status,
            record,
            storage,
            notification,
            warnings,
        })
    }

    /// Re-send the webhook notification for an existing record.
    ///
    /// Screenshots stored inline are decoded in place; screenshots held
    /// only as a reference are fetched back into binary first (from the
    /// image bucket, or over HTTP for an external URL) so the dispatch
    /// always attaches real bytes.
    pub async fn resend_notification(&self, session: &Session, id: Uuid) -> VigilResult<()> {
        let record = self.records.get_by_id(id).await?;
        authz::require(
            authz::can_view(session, &record.created_by),
            Capability::View,
        )?;

        let settings = self.settings.load().await.unwrap_or_default();
        let url = settings
            .webhook_url
            .as_deref()
            .ok_or_else(|| VigilError::Validation {
                message: "no webhook URL configured".into(),
            })?;

        let message = render_template(
            &settings.message_template,
            &MessageContext {
                individual_name: record.individual_name.clone(),
                date_time: record.date_time,
                location: record.location.clone(),
                reason: record.reason.clone(),
                seized_items: record.seized_items.clone(),
                responsible_officers: record.responsible_officers.clone(),
                created_by: record.created_by.clone(),
                articles: record.articles.clone(),
                observations: record.observations.clone(),
            },
        );

        let mut attachments = Vec::with_capacity(record.screenshots.len());
        for (index, screenshot) in record.screenshots.iter().enumerate() {
            let (content_type, bytes) = match screenshot {
                Screenshot::Inline { data } => parse_data_url(data).map_err(VigilError::from)?,
                Screenshot::Remote { url } if url.starts_with("http") => {
                    let bytes = self
                        .dispatcher
                        .fetch_remote(url)
                        .await
                        .map_err(VigilError::from)?;
                    let content_type = sniff_content_type(&bytes).map_err(VigilError::from)?;
                    (content_type, bytes)
                }
                Screenshot::Remote { url } => {
                    let store = self.images.as_ref().ok_or_else(|| {
                        VigilError::Internal("no image store configured".into())
                    })?;
                    let bytes = store.fetch(url).await?;
                    let content_type = sniff_content_type(&bytes).map_err(VigilError::from)?;
                    (content_type, bytes)
                }
            };
            attachments.push(Attachment {
                filename: format!("screenshot{index}.jpg"),
                content_type,
                bytes,
            });
        }

        self.dispatcher
            .send(url, &message, attachments)
            .await
            .map_err(VigilError::from)?;
        info!(id = %record.id, by = %session.username, "Notification re-sent");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Edit / delete / clear
    // -------------------------------------------------------------------

    /// Edit an existing record. Updates `edited_by`/`edited_at`;
    /// `created_by`/`created_at` never change.
    pub async fn edit_record(
        &self,
        session: &Session,
        id: Uuid,
        input: EditRecordInput,
    ) -> VigilResult<Record> {
        let existing = self.records.get_by_id(id).await?;
        authz::require(
            authz::can_edit(session, &existing.created_by),
            Capability::Edit,
        )?;

        let screenshots = match input.screenshots {
            Some(raw) => {
                let normalized = self.normalize_screenshots(raw).await?;
                Some(self.store_screenshots(&normalized).await?)
            }
            None => None,
        };

        let record = self
            .records
            .update(
                id,
                UpdateRecord {
                    individual_name: input.individual_name,
                    external_id: input.external_id,
                    location: input.location,
                    reason: input.reason,
                    responsible_officers: input.responsible_officers,
                    articles: input.articles,
                    seized_items: input.seized_items,
                    observations: input.observations,
                    date_time: input.date_time,
                    screenshots,
                    edited_by: session.username.clone(),
                },
            )
            .await?;

        self.append_audit(session, AuditAction::RecordEdit, &record)
            .await?;
        info!(id = %record.id, by = %session.username, "Record edited");

        Ok(record)
    }

    /// Delete a record, snapshotting it into the audit log.
    pub async fn delete_record(&self, session: &Session, id: Uuid) -> VigilResult<Record> {
        authz::require(authz::can_delete(session), Capability::Delete)?;

        let deleted = self
            .records
            .delete(id)
            .await?
            .ok_or_else(|| VigilError::NotFound {
                entity: "record".into(),
                id: id.to_string(),
            })?;

        self.append_audit(session, AuditAction::RecordDelete, &deleted)
            .await?;
        info!(id = %deleted.id, by = %session.username, "Record deleted");

        Ok(deleted)
    }

    /// Wipe every record (and, on the remote backend, every image).
    /// Application-owner only.
    pub async fn clear_all(&self, session: &Session) -> VigilResult<u64> {
        authz::require(authz::can_clear_all(session), Capability::ClearAll)?;

        let removed = self.records.clear_all().await?;

        self.audit
            .append(CreateAuditLogEntry {
                action: AuditAction::ClearAll,
                performed_by: session.username.clone(),
                target_user: None,
                target_record: None,
                details: format!("cleared {removed} records"),
            })
            .await?;
        warn!(removed, by = %session.username, "All records cleared");

        Ok(removed)
    }

    // -------------------------------------------------------------------
    // Read side
    // -------------------------------------------------------------------

    /// Records visible to the caller, newest first.
    pub async fn records(&self, session: &Session) -> VigilResult<Vec<Record>> {
        authz::require(session.role != Role::Pending, Capability::View)?;
        let all = self.records.list().await?;
        Ok(all
            .into_iter()
            .filter(|r| authz::can_view(session, &r.created_by))
            .collect())
    }

    /// Records for one individual (case-insensitive), newest first.
    pub async fn records_for_individual(
        &self,
        session: &Session,
        name: &str,
    ) -> VigilResult<Vec<Record>> {
        authz::require(session.role != Role::Pending, Capability::View)?;
        let matched = self.records.list_by_individual(name).await?;
        Ok(matched
            .into_iter()
            .filter(|r| authz::can_view(session, &r.created_by))
            .collect())
    }

    /// The per-individual aggregation view, recomputed on every read.
    pub async fn individuals(&self, session: &Session) -> VigilResult<Vec<IndividualGroup>> {
        let visible = self.records(session).await?;
        Ok(aggregate_by_individual(&visible))
    }

    /// Current backend utilization and any threshold warning.
    pub async fn quota_status(&self) -> VigilResult<QuotaStatus> {
        let usage = self.records.usage().await?;
        Ok(evaluate(usage, self.config.quota_warn_percent))
    }

    /// Recent audit entries, newest first. Admin only.
    pub async fn audit_trail(
        &self,
        session: &Session,
        limit: usize,
    ) -> VigilResult<Vec<AuditLogEntry>> {
        authz::require(authz::can_manage_users(session), Capability::ManageUsers)?;
        self.audit.list(limit).await
    }

    pub async fn settings(&self) -> VigilResult<Settings> {
        self.settings.load().await
    }

    /// Replace the settings object. Privileged roles only.
    pub async fn update_settings(
        &self,
        session: &Session,
        settings: Settings,
    ) -> VigilResult<()> {
        authz::require(
            authz::can_manage_users(session) || session.app_owner,
            Capability::ManageUsers,
        )?;
        self.settings.save(settings).await
    }

    // -------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------

    /// Run the CPU-bound pipeline off the async thread, one screenshot
    /// at a time. A rejected screenshot fails the submission naming its
    /// position; nothing unreadable is silently persisted.
    async fn normalize_screenshots(
        &self,
        raw: Vec<String>,
    ) -> VigilResult<Vec<NormalizedImage>> {
        let mut normalized = Vec::with_capacity(raw.len());
        for (index, data_url) in raw.into_iter().enumerate() {
            let media = self.config.media.clone();
            let result = tokio::task::spawn_blocking(move || {
                normalize_data_url(&data_url, &media)
            })
            .await
            .map_err(|e| VigilError::Internal(format!("image task failed: {e}")))?;

            match result {
                Ok(img) => normalized.push(img),
                Err(e) => {
                    let reason = match VigilError::from(e) {
                        VigilError::InvalidImageFormat { reason } => reason,
                        other => other.to_string(),
                    };
                    return Err(VigilError::InvalidImageFormat {
                        reason: format!("screenshot {}: {reason}", index + 1),
                    });
                }
            }
        }
        Ok(normalized)
    }

    /// Turn normalized images into stored screenshot references: upload
    /// to the bucket when one is configured, inline data URLs otherwise.
    async fn store_screenshots(
        &self,
        normalized: &[NormalizedImage],
    ) -> VigilResult<Vec<Screenshot>> {
        match &self.images {
            Some(store) => {
                let mut screenshots = Vec::with_capacity(normalized.len());
                for img in normalized {
                    // UUID filename: concurrent uploads cannot collide.
                    let filename = format!("{}.jpg", Uuid::new_v4());
                    let reference = store
                        .upload(&filename, &img.content_type, img.bytes.clone())
                        .await?;
                    screenshots.push(Screenshot::Remote { url: reference });
                }
                Ok(screenshots)
            }
            None => Ok(normalized
                .iter()
                .map(|img| Screenshot::Inline {
                    data: img.as_data_url(),
                })
                .collect()),
        }
    }

    async fn append_audit(
        &self,
        session: &Session,
        action: AuditAction,
        record: &Record,
    ) -> VigilResult<()> {
        let snapshot = serde_json::to_value(record)
            .map_err(|e| VigilError::Internal(format!("record snapshot failed: {e}")))?;
        self.audit
            .append(CreateAuditLogEntry {
                action,
                performed_by: session.username.clone(),
                target_user: None,
                target_record: Some(snapshot),
                details: format!("record {} for {}", record.id, record.individual_name),
            })
            .await?;
        Ok(())
    }
}

fn validate_submission(input: &SubmitRecordInput) -> VigilResult<()> {
    let required = [
        ("individualName", &input.individual_name),
        ("location", &input.location),
        ("reason", &input.reason),
        ("responsibleOfficers", &input.responsible_officers),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(VigilError::Validation {
                message: format!("required field {field} is empty"),
            });
        }
    }
    Ok(())
}
