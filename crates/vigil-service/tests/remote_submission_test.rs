//! Submission flow over the remote backend: screenshots leave the
//! record row and land in the image bucket as references.

use std::io::Read;
use std::sync::mpsc;
use std::thread;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

use vigil_core::authz::Session;
use vigil_core::models::record::Screenshot;
use vigil_core::models::settings::Settings;
use vigil_core::models::user::Role;
use vigil_core::repository::ImageStore;
use vigil_service::{
    RecordService, ServiceConfig, SinkReport, SubmitRecordInput, SubmitStatus,
};
use vigil_store::repository::{
    SurrealAuditLogRepository, SurrealImageStore, SurrealRecordRepository,
    SurrealSettingsRepository,
};
use vigil_store::run_migrations;

const LIMIT: u64 = 64 * 1024 * 1024;

type RemoteService = RecordService<
    SurrealRecordRepository<Db>,
    SurrealAuditLogRepository<Db>,
    SurrealSettingsRepository<Db>,
    SurrealImageStore<Db>,
>;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

fn service(db: &Surreal<Db>) -> RemoteService {
    RecordService::with_image_store(
        SurrealRecordRepository::new(db.clone(), LIMIT),
        SurrealAuditLogRepository::new(db.clone()),
        SurrealSettingsRepository::new(db.clone()),
        SurrealImageStore::new(db.clone()),
        ServiceConfig::default(),
    )
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

/// Accepts one request, replies 200, and hands the body back lossily
/// stringified (multipart bodies carry raw image bytes).
fn one_shot_server() -> (String, mpsc::Receiver<String>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let mut body = Vec::new();
            request.as_reader().read_to_end(&mut body).ok();
            let _ = request.respond(tiny_http::Response::empty(200));
            let _ = tx.send(String::from_utf8_lossy(&body).into_owned());
        }
    });
    (url, rx)
}

#[tokio::test]
async fn submission_uploads_screenshots_and_stores_references() {
    let db = setup().await;
    let service = service(&db);

    let mut input = sample_input();
    input.screenshots = vec![png_data_url(), png_data_url()];

    let outcome = service.submit_record(&officer(), input).await.unwrap();

    assert_eq!(outcome.status, SubmitStatus::Succeeded);
    assert!(matches!(outcome.notification, SinkReport::Skipped));

    // The row holds references, never inline image data.
    let record = outcome.record.unwrap();
    assert_eq!(record.screenshots.len(), 2);
    let images = SurrealImageStore::new(db.clone());
    for screenshot in &record.screenshots {
        match screenshot {
            Screenshot::Remote { url } => {
                assert!(url.ends_with(".jpg"), "reference: {url}");
                let bytes = images.fetch(url).await.unwrap();
                assert!(!bytes.is_empty());
            }
            other => panic!("expected remote reference, got {other:?}"),
        }
    }

    // Both uploads landed in the bucket, and utilization sees them.
    assert!(images.total_bytes().await.unwrap() > 0);
    let status = service.quota_status().await.unwrap();
    assert!(status.usage.used_bytes > 0);
}

#[tokio::test]
async fn resend_attaches_bucket_screenshots() {
    let db = setup().await;
    let service = service(&db);

    let mut input = sample_input();
    input.screenshots = vec![png_data_url()];
    let outcome = service.submit_record(&officer(), input).await.unwrap();
    let record = outcome.record.unwrap();

    let (url, rx) = one_shot_server();
    let admin = Session::new("admin", Role::Admin);
    let settings = Settings {
        webhook_url: Some(url),
        ..Settings::default()
    };
    service.update_settings(&admin, settings).await.unwrap();

    service
        .resend_notification(&officer(), record.id)
        .await
        .unwrap();

    let body = rx.recv().unwrap();
    assert!(body.contains("Jane Doe"));
    assert!(body.contains("screenshot0.jpg"));
}
