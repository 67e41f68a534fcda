//! Storage-layer error types and conversions.

use vigil_core::error::VigilError;

/// Storage-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("blob write of {used_bytes} bytes exceeds the {limit_bytes} byte ceiling")]
    QuotaExceeded { used_bytes: u64, limit_bytes: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blob serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl From<StoreError> for VigilError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => VigilError::NotFound { entity, id },
            StoreError::QuotaExceeded {
                used_bytes,
                limit_bytes,
            } => VigilError::QuotaExceeded {
                used_bytes,
                limit_bytes,
            },
            other => VigilError::BackendUnavailable(other.to_string()),
        }
    }
}
