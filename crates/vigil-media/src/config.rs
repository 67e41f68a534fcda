//! Media pipeline configuration.

/// Configuration for image normalization.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Maximum allowed width or height in pixels; larger images are
    /// scaled down preserving aspect ratio (default: 1600).
    pub max_dimension: u32,
    /// Target byte budget for the encoded image (default: 600 KiB).
    pub byte_budget: usize,
    /// Starting JPEG quality factor, 0–100 (default: 70).
    pub quality_start: u8,
    /// Quality decrement per re-encode step (default: 10).
    pub quality_step: u8,
    /// Quality floor; reaching it ends the loop (default: 10).
    pub quality_floor: u8,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1600,
            byte_budget: 600 * 1024,
            quality_start: 70,
            quality_step: 10,
            quality_floor: 10,
        }
    }
}
