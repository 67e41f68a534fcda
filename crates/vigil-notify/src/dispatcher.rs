//! Webhook dispatcher: one multipart POST per notification.

use tracing::{debug, warn};

use crate::error::NotifyError;

/// One binary attachment in the multipart body.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Sends notifications to an external chat webhook.
///
/// The request body is multipart: a `payload_json` part carrying the
/// message as `{"content": …}`, plus binary parts named positionally
/// (`file0`, `file1`, …). Any 2xx response is success.
#[derive(Clone, Default)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `content` and `attachments` to `url`.
    pub async fn send(
        &self,
        url: &str,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), NotifyError> {
        let payload = serde_json::json!({ "content": content }).to_string();
        let mut form = reqwest::multipart::Form::new().text("payload_json", payload);

        for (index, attachment) in attachments.into_iter().enumerate() {
            let part = reqwest::multipart::Part::bytes(attachment.bytes)
                .file_name(attachment.filename)
                .mime_str(&attachment.content_type)
                .map_err(|e| NotifyError::InvalidAttachment(e.to_string()))?;
            form = form.part(format!("file{index}"), part);
        }

        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(%status, "Webhook notification delivered");
            Ok(())
        } else {
            warn!(%status, "Webhook rejected the notification");
            Err(NotifyError::Rejected {
                status: status.as_u16(),
            })
        }
    }

    /// Fetch a screenshot that exists only as a remote URL so it can be
    /// attached as a binary part.
    pub async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, NotifyError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
