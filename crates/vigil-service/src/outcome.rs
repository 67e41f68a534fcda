//! The three-way submission outcome.
//!
//! Storage and notification are independent sinks; the pair of their
//! results is classified here instead of being threaded through ad hoc
//! try/catch flags. Overall failure is declared only when every
//! requested sink failed or none was requested.

use vigil_core::VigilError;
use vigil_core::models::record::Record;

/// How one sink ended: skipped (disabled), succeeded, or failed.
#[derive(Debug)]
pub enum SinkReport {
    Skipped,
    Succeeded,
    Failed(VigilError),
}

impl SinkReport {
    pub fn succeeded(&self) -> bool {
        matches!(self, SinkReport::Succeeded)
    }

    fn requested(&self) -> bool {
        !matches!(self, SinkReport::Skipped)
    }

    pub fn error(&self) -> Option<&VigilError> {
        match self {
            SinkReport::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Every requested sink completed.
    Succeeded,
    /// One of two requested sinks completed.
    Partial,
    /// Every requested sink failed, or none was requested.
    Failed,
}

/// Structured result of one record submission.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub status: SubmitStatus,
    /// The persisted record, when the storage sink succeeded.
    pub record: Option<Record>,
    pub storage: SinkReport,
    pub notification: SinkReport,
    /// Soft warnings (quota threshold, failed sink descriptions).
    pub warnings: Vec<String>,
}

pub(crate) fn classify(storage: &SinkReport, notification: &SinkReport) -> SubmitStatus {
    let requested = [storage, notification]
        .into_iter()
        .filter(|s| s.requested())
        .count();
    let succeeded = [storage, notification]
        .into_iter()
        .filter(|s| s.succeeded())
        .count();

    if requested == 0 || succeeded == 0 {
        SubmitStatus::Failed
    } else if succeeded == requested {
        SubmitStatus::Succeeded
    } else {
        SubmitStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> SinkReport {
        SinkReport::Failed(VigilError::BackendUnavailable("boom".into()))
    }

    #[test]
    fn both_succeed() {
        assert_eq!(
            classify(&SinkReport::Succeeded, &SinkReport::Succeeded),
            SubmitStatus::Succeeded
        );
    }

    #[test]
    fn one_sink_failing_is_partial() {
        assert_eq!(
            classify(&SinkReport::Succeeded, &failed()),
            SubmitStatus::Partial
        );
        assert_eq!(
            classify(&failed(), &SinkReport::Succeeded),
            SubmitStatus::Partial
        );
    }

    #[test]
    fn disabled_sink_does_not_dilute_success() {
        assert_eq!(
            classify(&SinkReport::Succeeded, &SinkReport::Skipped),
            SubmitStatus::Succeeded
        );
        assert_eq!(
            classify(&SinkReport::Skipped, &SinkReport::Succeeded),
            SubmitStatus::Succeeded
        );
    }

    #[test]
    fn failure_requires_every_requested_sink_to_fail() {
        assert_eq!(classify(&failed(), &failed()), SubmitStatus::Failed);
        assert_eq!(
            classify(&failed(), &SinkReport::Skipped),
            SubmitStatus::Failed
        );
    }

    #[test]
    fn nothing_requested_is_a_failure() {
        assert_eq!(
            classify(&SinkReport::Skipped, &SinkReport::Skipped),
            SubmitStatus::Failed
        );
    }
}
