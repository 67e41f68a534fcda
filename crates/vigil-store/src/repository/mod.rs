//! SurrealDB repository implementations for the remote backend.

mod audit;
mod image;
mod record;
mod settings;
mod user;

pub use audit::SurrealAuditLogRepository;
pub use image::SurrealImageStore;
pub use record::SurrealRecordRepository;
pub use settings::SurrealSettingsRepository;
pub use user::{SurrealUserRepository, verify_password};
