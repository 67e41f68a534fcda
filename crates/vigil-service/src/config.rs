//! Service configuration.

use vigil_media::MediaConfig;

/// Configuration for the orchestration layer.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Image normalization parameters.
    pub media: MediaConfig,
    /// Utilization percentage at which the quota monitor starts
    /// warning before image-heavy writes (default: 80.0).
    pub quota_warn_percent: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            media: MediaConfig::default(),
            quota_warn_percent: 80.0,
        }
    }
}
