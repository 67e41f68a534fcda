//! End-to-end submission flow over the local blob store, with a real
//! HTTP listener standing in for the chat webhook.

use std::io::Read;
use std::sync::mpsc;
use std::thread;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use tempfile::TempDir;

use vigil_core::VigilError;
use vigil_core::authz::Session;
use vigil_core::models::audit::AuditAction;
use vigil_core::models::record::{CreateRecord, Screenshot};
use vigil_core::models::settings::Settings;
use vigil_core::models::user::Role;
use vigil_core::repository::RecordRepository;
use vigil_service::{
    EditRecordInput, RecordService, ServiceConfig, SinkReport, SubmitRecordInput, SubmitStatus,
};
use vigil_store::{LocalStore, LocalStoreConfig};

type LocalService = RecordService<LocalStore, LocalStore, LocalStore>;

fn blob_store(dir: &TempDir) -> LocalStore {
    LocalStore::new(LocalStoreConfig::new(dir.path().join("vigil.json")))
}

/// Clones of one store share the write lock, so the three repository
/// roles serialize their mutations on the same blob.
fn service_over(store: &LocalStore) -> LocalService {
    RecordService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        ServiceConfig::default(),
    )
}

fn local_service(dir: &TempDir) -> LocalService {
    service_over(&blob_store(dir))
}

fn officer() -> Session {
    Session::new("smith", Role::Officer)
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_fn(48, 48, |x, y| {
        image::Rgb([(x * 5) as u8, (y * 5) as u8, 128])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn png_data_url() -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()))
}

fn sample_input() -> SubmitRecordInput {
    SubmitRecordInput {
        individual_name: "Jane Doe".into(),
        external_id: Some("ID-4471".into()),
        location: "North entrance".into(),
        reason: "Unauthorized access".into(),
        responsible_officers: "Smith, Jones".into(),
        articles: vec!["§12".into(), "§15a".into()],
        seized_items: Some("one keycard".into()),
        observations: None,
        date_time: Utc::now(),
        screenshots: Vec::new(),
    }
}

/// Accepts one request, replies with `status`, and hands the raw body
/// back through the channel.
fn one_shot_server(status: u16) -> (String, mpsc::Receiver<String>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            // Multipart bodies carry raw image bytes, so read them as
            // bytes and lossily stringify for the assertions.
            let mut body = Vec::new();
            request.as_reader().read_to_end(&mut body).ok();
            let _ = request.respond(tiny_http::Response::empty(status));
            let _ = tx.send(String::from_utf8_lossy(&body).into_owned());
        }
    });
    (url, rx)
}

/// Serves `bytes` to one request and exits.
fn one_shot_file_server(bytes: Vec<u8>) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let _ = request.respond(tiny_http::Response::from_data(bytes));
        }
    });
    url
}

async fn enable_webhook(service: &LocalService, url: &str) {
    let admin = Session::new("admin", Role::Admin);
    let settings = Settings {
        webhook_url: Some(url.to_string()),
        ..Settings::default()
    };
    service.update_settings(&admin, settings).await.unwrap();
}

#[tokio::test]
async fn submission_reaches_both_sinks() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);
    let (url, rx) = one_shot_server(200);
    enable_webhook(&service, &url).await;

    let mut input = sample_input();
    input.screenshots = vec![png_data_url()];

    let outcome = service.submit_record(&officer(), input).await.unwrap();

    assert_eq!(outcome.status, SubmitStatus::Succeeded);
    assert!(outcome.storage.succeeded());
    assert!(outcome.notification.succeeded());

    let record = outcome.record.unwrap();
    assert_eq!(record.created_by, "smith");
    assert_eq!(record.screenshots.len(), 1);
    match &record.screenshots[0] {
        Screenshot::Inline { data } => assert!(data.starts_with("data:image/jpeg;base64,")),
        other => panic!("expected inline screenshot, got {other:?}"),
    }

    let body = rx.recv().unwrap();
    assert!(body.contains("Jane Doe"));
    assert!(body.contains("screenshot0.jpg"));

    let audit = service
        .audit_trail(&Session::new("admin", Role::Admin), 10)
        .await
        .unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::RecordCreate);
    assert!(audit[0].target_record.is_some());
}

#[tokio::test]
async fn webhook_rejection_is_partial_but_record_persists() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);
    let (url, _rx) = one_shot_server(500);
    enable_webhook(&service, &url).await;

    let outcome = service
        .submit_record(&officer(), sample_input())
        .await
        .unwrap();

    assert_eq!(outcome.status, SubmitStatus::Partial);
    assert!(outcome.record.is_some());
    assert!(matches!(outcome.notification, SinkReport::Failed(_)));
    assert!(outcome.warnings.iter().any(|w| w.contains("notification")));

    // The record survived the failed notification.
    let visible = service.records(&officer()).await.unwrap();
    assert_eq!(visible.len(), 1);
}

#[tokio::test]
async fn storage_quota_failure_is_partial_when_webhook_delivers() {
    let dir = TempDir::new().unwrap();
    let mut config = LocalStoreConfig::new(dir.path().join("vigil.json"));
    config.limit_bytes = 256;
    let service: LocalService = RecordService::new(
        LocalStore::new(config),
        blob_store(&dir),
        blob_store(&dir),
        ServiceConfig::default(),
    );
    let (url, _rx) = one_shot_server(200);
    enable_webhook(&service, &url).await;

    let mut input = sample_input();
    input.observations = Some("x".repeat(1024));

    let outcome = service.submit_record(&officer(), input).await.unwrap();

    assert_eq!(outcome.status, SubmitStatus::Partial);
    assert!(outcome.record.is_none());
    assert!(matches!(
        outcome.storage,
        SinkReport::Failed(VigilError::QuotaExceeded { .. })
    ));

    // Rejected write left the store untouched, and nothing was audited.
    let visible = service.records(&officer()).await.unwrap();
    assert!(visible.is_empty());
    let audit = service
        .audit_trail(&Session::new("admin", Role::Admin), 10)
        .await
        .unwrap();
    assert!(audit.is_empty());
}

#[tokio::test]
async fn disabled_webhook_still_succeeds() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    let outcome = service
        .submit_record(&officer(), sample_input())
        .await
        .unwrap();

    assert_eq!(outcome.status, SubmitStatus::Succeeded);
    assert!(matches!(outcome.notification, SinkReport::Skipped));
    assert!(outcome.record.is_some());
}

#[tokio::test]
async fn blank_required_field_is_rejected_before_any_side_effect() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    let mut input = sample_input();
    input.location = "   ".into();

    let err = service.submit_record(&officer(), input).await.unwrap_err();
    assert!(matches!(err, VigilError::Validation { .. }));

    let visible = service.records(&officer()).await.unwrap();
    assert!(visible.is_empty());
}

#[tokio::test]
async fn pending_account_cannot_submit() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    let pending = Session::new("newbie", Role::Pending);
    let err = service
        .submit_record(&pending, sample_input())
        .await
        .unwrap_err();
    assert!(matches!(err, VigilError::PermissionDenied { .. }));
}

#[tokio::test]
async fn unreadable_screenshot_rejects_the_submission() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    let mut input = sample_input();
    input.screenshots = vec![format!(
        "data:image/png;base64,{}",
        STANDARD.encode(b"not an image")
    )];

    let err = service.submit_record(&officer(), input).await.unwrap_err();
    match err {
        VigilError::InvalidImageFormat { reason } => {
            assert!(reason.contains("screenshot 1"), "reason: {reason}");
        }
        other => panic!("expected invalid image error, got {other:?}"),
    }

    let visible = service.records(&officer()).await.unwrap();
    assert!(visible.is_empty());
}

#[tokio::test]
async fn edit_merges_fields_and_audits() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    let outcome = service
        .submit_record(&officer(), sample_input())
        .await
        .unwrap();
    let created = outcome.record.unwrap();

    let edited = service
        .edit_record(
            &officer(),
            created.id,
            EditRecordInput {
                location: Some("South gate".into()),
                ..EditRecordInput::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(edited.location, "South gate");
    assert_eq!(edited.individual_name, created.individual_name);
    assert_eq!(edited.created_by, "smith");
    assert_eq!(edited.created_at, created.created_at);
    assert_eq!(edited.edited_by.as_deref(), Some("smith"));
    assert!(edited.edited_at.is_some());

    let audit = service
        .audit_trail(&Session::new("admin", Role::Admin), 10)
        .await
        .unwrap();
    assert_eq!(audit[0].action, AuditAction::RecordEdit);
}

#[tokio::test]
async fn org_owner_edits_only_its_own_records() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    let outcome = service
        .submit_record(&officer(), sample_input())
        .await
        .unwrap();
    let created = outcome.record.unwrap();

    let org = Session::new("acme", Role::OrgOwner);
    let err = service
        .edit_record(&org, created.id, EditRecordInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, VigilError::PermissionDenied { .. }));
}

#[tokio::test]
async fn delete_snapshots_the_record_into_the_audit_log() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    let outcome = service
        .submit_record(&officer(), sample_input())
        .await
        .unwrap();
    let created = outcome.record.unwrap();

    let deleted = service.delete_record(&officer(), created.id).await.unwrap();
    assert_eq!(deleted.id, created.id);

    let visible = service.records(&officer()).await.unwrap();
    assert!(visible.is_empty());

    let audit = service
        .audit_trail(&Session::new("admin", Role::Admin), 10)
        .await
        .unwrap();
    assert_eq!(audit[0].action, AuditAction::RecordDelete);
    let snapshot = audit[0].target_record.as_ref().unwrap();
    assert_eq!(snapshot["individual_name"], "Jane Doe");
}

#[tokio::test]
async fn org_owner_view_is_scoped_to_its_own_records() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    service
        .submit_record(&officer(), sample_input())
        .await
        .unwrap();

    let org = Session::new("acme", Role::OrgOwner);
    let mut own = sample_input();
    own.individual_name = "John Roe".into();
    service.submit_record(&org, own).await.unwrap();

    let visible = service.records(&org).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].created_by, "acme");

    let all = service.records(&officer()).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn individuals_view_groups_case_insensitively() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    for name in ["Jane Doe", "JANE DOE", "John Roe"] {
        let mut input = sample_input();
        input.individual_name = name.into();
        service.submit_record(&officer(), input).await.unwrap();
    }

    let groups = service.individuals(&officer()).await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].count, 2);
    assert_eq!(groups[0].key, "jane doe");
}

#[tokio::test]
async fn clear_all_requires_the_application_owner() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    service
        .submit_record(&officer(), sample_input())
        .await
        .unwrap();

    let admin = Session::new("admin", Role::Admin);
    let err = service.clear_all(&admin).await.unwrap_err();
    assert!(matches!(err, VigilError::PermissionDenied { .. }));

    let owner = Session::owner("root");
    let removed = service.clear_all(&owner).await.unwrap();
    assert_eq!(removed, 1);

    let audit = service.audit_trail(&admin, 10).await.unwrap();
    assert_eq!(audit[0].action, AuditAction::ClearAll);
}

fn stored_record(screenshots: Vec<Screenshot>) -> CreateRecord {
    CreateRecord {
        individual_name: "Jane Doe".into(),
        external_id: None,
        location: "North entrance".into(),
        reason: "Unauthorized access".into(),
        responsible_officers: "Smith, Jones".into(),
        articles: vec!["§12".into()],
        seized_items: None,
        observations: None,
        date_time: Utc::now(),
        screenshots,
        created_by: "smith".into(),
    }
}

#[tokio::test]
async fn resend_fetches_remote_only_screenshots() {
    let dir = TempDir::new().unwrap();
    let store = blob_store(&dir);
    let service = service_over(&store);

    // One screenshot is inline, one exists only behind a URL; the
    // dispatch must attach real bytes for both.
    let image_url = one_shot_file_server(png_bytes());
    let record = store
        .create(stored_record(vec![
            Screenshot::Inline {
                data: png_data_url(),
            },
            Screenshot::Remote { url: image_url },
        ]))
        .await
        .unwrap();

    let (url, rx) = one_shot_server(200);
    enable_webhook(&service, &url).await;

    service
        .resend_notification(&officer(), record.id)
        .await
        .unwrap();

    let body = rx.recv().unwrap();
    assert!(body.contains("Jane Doe"));
    assert!(body.contains("screenshot0.jpg"));
    assert!(body.contains("screenshot1.jpg"));
}

#[tokio::test]
async fn resend_without_a_webhook_is_invalid() {
    let dir = TempDir::new().unwrap();
    let store = blob_store(&dir);
    let service = service_over(&store);

    let record = store.create(stored_record(Vec::new())).await.unwrap();

    let err = service
        .resend_notification(&officer(), record.id)
        .await
        .unwrap_err();
    assert!(matches!(err, VigilError::Validation { .. }));
}

#[tokio::test]
async fn quota_status_reports_utilization() {
    let dir = TempDir::new().unwrap();
    let service = local_service(&dir);

    service
        .submit_record(&officer(), sample_input())
        .await
        .unwrap();

    let status = service.quota_status().await.unwrap();
    assert!(status.usage.used_bytes > 0);
    assert!(status.warning.is_none());
}
