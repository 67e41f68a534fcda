//! Quota monitor: utilization against the configured ceiling.

use vigil_core::repository::StorageUsage;

/// Snapshot of backend utilization for the caller.
#[derive(Debug, Clone)]
pub struct QuotaStatus {
    pub usage: StorageUsage,
    /// Present once utilization crosses the warning threshold.
    pub warning: Option<String>,
}

pub(crate) fn evaluate(usage: StorageUsage, warn_percent: f64) -> QuotaStatus {
    let percent = usage.percent();
    let warning = (percent >= warn_percent).then(|| {
        format!(
            "storage is {percent:.0}% full ({} of {} bytes); \
             delete old records before adding image-heavy ones",
            usage.used_bytes, usage.limit_bytes
        )
    });
    QuotaStatus { usage, warning }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_quiet() {
        let status = evaluate(
            StorageUsage {
                used_bytes: 100,
                limit_bytes: 1000,
            },
            80.0,
        );
        assert!(status.warning.is_none());
    }

    #[test]
    fn crossing_threshold_warns() {
        let status = evaluate(
            StorageUsage {
                used_bytes: 850,
                limit_bytes: 1000,
            },
            80.0,
        );
        let warning = status.warning.unwrap();
        assert!(warning.contains("85%"));
    }

    #[test]
    fn zero_limit_never_warns() {
        let status = evaluate(
            StorageUsage {
                used_bytes: 10,
                limit_bytes: 0,
            },
            80.0,
        );
        assert!(status.warning.is_none());
    }
}
