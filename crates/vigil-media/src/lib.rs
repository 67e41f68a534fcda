//! VIGIL Media: normalizes arbitrarily large user-supplied images into
//! a bounded-size encoded form before storage or attachment.
//!
//! The pipeline decodes, scales down to a configured maximum dimension
//! preserving aspect ratio, and re-encodes as JPEG, stepping the quality
//! factor down until a byte budget is met or a floor is reached. The
//! floor guarantees termination; at the floor the output never exceeds
//! the pre-compression input.

pub mod config;
pub mod dataurl;
pub mod error;
pub mod pipeline;

pub use config::MediaConfig;
pub use dataurl::{parse_data_url, to_data_url};
pub use error::MediaError;
pub use pipeline::{NormalizedImage, normalize, normalize_data_url, sniff_content_type};
