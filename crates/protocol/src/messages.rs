use serde::{Deserialize, Serialize};

use crate::types::{ConfigPatch, Configuration, UpdateInfo};

// ---------------------------------------------------------------------------
// Requests (presentation -> session)
// ---------------------------------------------------------------------------

/// A user action forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Request {
    /// Asks for the current configuration.
    GetConfig,
    /// A folder was picked in the front end.
    SelectFolder { path: String },
    /// A file was picked in the front end.
    SelectFile { path: String },
    /// Changes one or more configuration fields.
    UpdateConfig { config: ConfigPatch },
    /// Uploads a file, archiving it first if it is a directory.
    Upload {
        path: String,
        /// Blob name override; defaults to the (archive) file name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        destination_name: Option<String>,
    },
    /// Cancels the active upload, if any.
    Abort,
    /// Checks the release feed for a newer version.
    CheckForUpdates,
}

impl Request {
    /// Returns the wire name of this request.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetConfig => "get-config",
            Self::SelectFolder { .. } => "select-folder",
            Self::SelectFile { .. } => "select-file",
            Self::UpdateConfig { .. } => "update-config",
            Self::Upload { .. } => "upload",
            Self::Abort => "abort",
            Self::CheckForUpdates => "check-for-updates",
        }
    }
}

// ---------------------------------------------------------------------------
// Responses (session -> presentation)
// ---------------------------------------------------------------------------

/// A state change reported back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Response {
    InitialConfig {
        config: Configuration,
    },
    /// `None` when the selected path is missing or not a directory.
    FolderSelected {
        path: Option<String>,
    },
    /// `None` when the selected path is missing or not a regular file.
    FileSelected {
        path: Option<String>,
    },
    /// A folder was zipped ahead of upload.
    FolderCompressed {
        archive_path: String,
    },
    ConfigUpdated {
        config: Configuration,
    },
    UploadProgress {
        transferred_bytes: u64,
        total_bytes: u64,
    },
    UploadFinished {
        request_id: String,
        blob_url: String,
    },
    UploadFailed {
        error: String,
    },
    UploadAborted,
    CheckForUpdatesResult {
        update: Option<UpdateInfo>,
    },
}

impl Response {
    /// Returns `true` for the events that end an upload.
    pub fn is_upload_terminal(&self) -> bool {
        matches!(
            self,
            Self::UploadFinished { .. } | Self::UploadFailed { .. } | Self::UploadAborted
        )
    }
}
