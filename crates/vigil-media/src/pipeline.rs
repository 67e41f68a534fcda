//! The normalization pipeline: decode, bounded resize, quality-stepped
//! JPEG re-encode.

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::debug;

use crate::config::MediaConfig;
use crate::dataurl::{parse_data_url, to_data_url};
use crate::error::MediaError;

/// Result of normalizing one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    /// Quality factor of the final encode; `None` when the original
    /// input was kept because even the floor encode was larger.
    pub quality: Option<u8>,
}

impl NormalizedImage {
    pub fn as_data_url(&self) -> String {
        to_data_url(&self.content_type, &self.bytes)
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, MediaError> {
    let mut out = Vec::new();
    // JPEG carries no alpha channel.
    let rgb = img.to_rgb8();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| MediaError::Encode(e.to_string()))?;
    Ok(out)
}

/// Normalize raw image bytes to the configured dimension and byte budget.
///
/// A decode failure is an error; the caller decides what to do with the
/// rejected screenshot; nothing unreadable is passed through.
pub fn normalize(input: &[u8], config: &MediaConfig) -> Result<NormalizedImage, MediaError> {
    let decoded =
        image::load_from_memory(input).map_err(|e| MediaError::Decode(e.to_string()))?;

    let (w, h) = (decoded.width(), decoded.height());
    let resized = if w > config.max_dimension || h > config.max_dimension {
        // Longer side ends up exactly at max_dimension.
        decoded.resize(
            config.max_dimension,
            config.max_dimension,
            FilterType::Lanczos3,
        )
    } else {
        decoded
    };

    let mut quality = config.quality_start;
    let mut encoded = encode_jpeg(&resized, quality)?;
    while encoded.len() > config.byte_budget && quality > config.quality_floor {
        quality = quality
            .saturating_sub(config.quality_step)
            .max(config.quality_floor);
        encoded = encode_jpeg(&resized, quality)?;
    }

    debug!(
        input_bytes = input.len(),
        output_bytes = encoded.len(),
        quality,
        width = resized.width(),
        height = resized.height(),
        "Image normalized"
    );

    // Floor reached and still over budget: the output must never exceed
    // the pre-compression input, so the smaller of the two wins.
    if encoded.len() > config.byte_budget && encoded.len() > input.len() {
        return Ok(NormalizedImage {
            bytes: input.to_vec(),
            content_type: sniff_content_type(input)?,
            width: w,
            height: h,
            quality: None,
        });
    }

    Ok(NormalizedImage {
        bytes: encoded,
        content_type: "image/jpeg".into(),
        width: resized.width(),
        height: resized.height(),
        quality: Some(quality),
    })
}

/// Normalize a data-URL screenshot; rejects anything that does not carry
/// a recognized image prefix before decoding.
pub fn normalize_data_url(
    input: &str,
    config: &MediaConfig,
) -> Result<NormalizedImage, MediaError> {
    let (_, bytes) = parse_data_url(input)?;
    normalize(&bytes, config)
}

/// Identify an image payload by its magic number.
pub fn sniff_content_type(bytes: &[u8]) -> Result<String, MediaError> {
    let mime = match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => {
            return Err(MediaError::InvalidFormat(
                "unknown magic number".into(),
            ));
        }
    };
    Ok(mime.to_string())
}
