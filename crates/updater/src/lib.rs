//! Update checks against a release manifest feed.
//!
//! The feed is a directory holding one `latest*.yml` manifest per platform.
//! [`UpdateChecker`] fetches the manifest for the running platform and
//! reports an [`UpdateInfo`](blobdrop_protocol::UpdateInfo) when the
//! published version is newer than the running one.

mod checker;
mod manifest;
mod platform;
mod version;

pub use checker::UpdateChecker;
pub use manifest::{ManifestFile, UpdateManifest};
pub use platform::Platform;
pub use version::is_newer;

/// Errors from an update check.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("invalid feed URL: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid manifest: {0}")]
    Manifest(String),
}
