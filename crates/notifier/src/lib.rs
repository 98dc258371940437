//! Webhook notification for completed uploads.
//!
//! Delivery is best-effort: [`WebhookNotifier::notify`] logs failures and
//! never reports them to the caller, so a broken webhook can not turn a
//! finished upload into a failed one.

use std::time::Duration;

use blobdrop_protocol::WebhookPayload;
use tracing::{debug, info, warn};

/// Default bound on a webhook call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a webhook call.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Posts completion payloads to a webhook URL.
pub struct WebhookNotifier {
    http: reqwest::Client,
}

impl WebhookNotifier {
    /// Creates a notifier with the default timeout.
    pub fn new() -> Result<Self, NotifyError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Posts `payload` to `url`, logging instead of failing.
    ///
    /// An empty `url` means no webhook is configured.
    pub async fn notify(&self, url: &str, payload: &WebhookPayload) {
        if url.trim().is_empty() {
            debug!("no webhook configured, skipping notification");
            return;
        }
        match self.try_notify(url, payload).await {
            Ok(()) => info!(webhook = url, blob_url = %payload.blob_url, "webhook notified"),
            Err(e) => warn!(webhook = url, error = %e, "webhook notification failed"),
        }
    }

    /// Posts `payload` to `url` and reports the outcome.
    pub async fn try_notify(&self, url: &str, payload: &WebhookPayload) -> Result<(), NotifyError> {
        let resp = self.http.post(url.trim()).json(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
