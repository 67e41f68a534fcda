//! Notification error types and conversions.

use vigil_core::error::VigilError;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("webhook transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook rejected the payload with status {status}")]
    Rejected { status: u16 },

    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),
}

impl From<NotifyError> for VigilError {
    fn from(err: NotifyError) -> Self {
        VigilError::NotificationFailed(err.to_string())
    }
}
