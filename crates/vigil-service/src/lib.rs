//! VIGIL Service: orchestration of the record persistence, media
//! processing, and notification pipeline.
//!
//! Every entry point takes an explicit [`Session`]; there is no
//! ambient "current user" state. Storage and notification are two
//! independent best-effort sinks joined only at the end into a
//! three-way submission outcome.
//!
//! [`Session`]: vigil_core::authz::Session

pub mod config;
pub mod outcome;
pub mod quota;
pub mod records;
pub mod users;

pub use config::ServiceConfig;
pub use outcome::{SinkReport, SubmitOutcome, SubmitStatus};
pub use quota::QuotaStatus;
pub use records::{EditRecordInput, NoImageStore, RecordService, SubmitRecordInput};
pub use users::UserService;
