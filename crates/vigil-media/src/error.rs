//! Media-layer error types and conversions.

use vigil_core::error::VigilError;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Input is not a recognized image payload (bad prefix, bad base64,
    /// unknown magic number). Rejected before the pipeline runs.
    #[error("unrecognized image input: {0}")]
    InvalidFormat(String),

    /// The payload looked like an image but could not be decoded.
    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("image encode failed: {0}")]
    Encode(String),
}

impl From<MediaError> for VigilError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidFormat(reason) | MediaError::Decode(reason) => {
                VigilError::InvalidImageFormat { reason }
            }
            MediaError::Encode(msg) => VigilError::Internal(msg),
        }
    }
}
