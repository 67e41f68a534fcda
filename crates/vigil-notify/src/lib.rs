//! VIGIL Notify: best-effort delivery of a human-readable incident
//! summary plus image attachments to an external chat webhook.
//!
//! Dispatch is fire-and-forget with respect to persistence: a failure
//! here becomes a soft warning in the submission outcome and never
//! blocks or rolls back the storage write.

pub mod dispatcher;
pub mod error;
pub mod template;

pub use dispatcher::{Attachment, WebhookDispatcher};
pub use error::NotifyError;
pub use template::{MessageContext, render_template};
