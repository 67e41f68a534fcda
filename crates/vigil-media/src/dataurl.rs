//! Data-URL parsing and construction.
//!
//! Screenshots arrive from the form layer as base64 data URLs
//! (`data:image/png;base64,…`). Anything without that shape is rejected
//! before the pipeline runs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::MediaError;

const RECOGNIZED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Split a data URL into its content type and decoded bytes.
pub fn parse_data_url(input: &str) -> Result<(String, Vec<u8>), MediaError> {
    let rest = input
        .strip_prefix("data:")
        .ok_or_else(|| MediaError::InvalidFormat("missing data: prefix".into()))?;

    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| MediaError::InvalidFormat("missing ;base64, separator".into()))?;

    if !RECOGNIZED_TYPES.contains(&mime) {
        return Err(MediaError::InvalidFormat(format!(
            "unsupported content type: {mime}"
        )));
    }

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| MediaError::InvalidFormat(format!("invalid base64 payload: {e}")))?;

    Ok((mime.to_string(), bytes))
}

/// Build a data URL from a content type and raw bytes.
pub fn to_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_data_url() {
        let bytes = vec![1u8, 2, 3, 4];
        let url = to_data_url("image/png", &bytes);
        let (mime, decoded) = parse_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = parse_data_url("hello world").unwrap_err();
        assert!(matches!(err, MediaError::InvalidFormat(_)));
    }

    #[test]
    fn rejects_non_image_type() {
        let err = parse_data_url("data:text/plain;base64,aGk=").unwrap_err();
        assert!(matches!(err, MediaError::InvalidFormat(_)));
    }

    #[test]
    fn rejects_bad_base64() {
        let err = parse_data_url("data:image/png;base64,!!!").unwrap_err();
        assert!(matches!(err, MediaError::InvalidFormat(_)));
    }
}
