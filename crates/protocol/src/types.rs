use serde::{Deserialize, Serialize};

/// Persisted user configuration.
///
/// Field names double as the persisted keys, so they stay snake_case on
/// the wire. Every field defaults to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Storage account connection string (SAS or shared key).
    #[serde(default)]
    pub connection_string: String,
    /// Target container name.
    #[serde(default)]
    pub container_name: String,
    /// Public base URL used to build the reported blob URL.
    #[serde(default)]
    pub url: String,
    /// Webhook notified after a successful upload.
    #[serde(default)]
    pub webhook: String,
}

impl Configuration {
    /// Applies every field present in `patch`, leaving the others untouched.
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(v) = patch.connection_string {
            self.connection_string = v;
        }
        if let Some(v) = patch.container_name {
            self.container_name = v;
        }
        if let Some(v) = patch.url {
            self.url = v;
        }
        if let Some(v) = patch.webhook {
            self.webhook = v;
        }
    }
}

/// Partial configuration update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
}

impl ConfigPatch {
    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.connection_string.is_none()
            && self.container_name.is_none()
            && self.url.is_none()
            && self.webhook.is_none()
    }
}

/// Lifecycle state of a transfer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferState {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "aborted")]
    Aborted,
}

impl TransferState {
    /// Completed, Failed and Aborted are terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    /// Service request id of the commit call.
    pub request_id: String,
    /// Public URL of the uploaded blob.
    pub blob_url: String,
}

/// A newer release than the running one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub latest_version: String,
    pub download_url: String,
}

/// Body POSTed to the configured webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub blob_url: String,
}
