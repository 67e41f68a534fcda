//! Error types for the VIGIL system.

use thiserror::Error;

use crate::authz::Capability;

#[derive(Debug, Error)]
pub enum VigilError {
    #[error("Permission denied: missing capability {capability}")]
    PermissionDenied { capability: Capability },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid image format: {reason}")]
    InvalidImageFormat { reason: String },

    /// Distinct from [`VigilError::BackendUnavailable`]; callers surface
    /// the two differently.
    #[error(
        "Storage quota exceeded: {used_bytes} of {limit_bytes} bytes in use; \
         free space by deleting old records before writing again"
    )]
    QuotaExceeded { used_bytes: u64, limit_bytes: u64 },

    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Notification delivery failed: {0}")]
    NotificationFailed(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VigilResult<T> = Result<T, VigilError>;
