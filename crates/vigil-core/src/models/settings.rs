//! Operator-editable settings, stored as one object.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MESSAGE_TEMPLATE: &str = "\
**New incident record**\n\
Individual: {individualName}\n\
Date/time: {dateTime}\n\
Location: {location}\n\
Reason: {reason}\n\
Articles: {articles}\n\
Seized items: {seizedItems}\n\
Observations: {observations}\n\
Responsible officers: {responsibleOfficers}\n\
Logged by: {createdBy}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Webhook endpoint; `None` disables the notification sink.
    pub webhook_url: Option<String>,
    /// Template with `{placeholder}` substitution (see `vigil-notify`).
    pub message_template: String,
    pub title: String,
    pub subtitle: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            message_template: DEFAULT_MESSAGE_TEMPLATE.into(),
            title: "VIGIL".into(),
            subtitle: "Incident record log".into(),
            logo_url: None,
            favicon_url: None,
        }
    }
}
