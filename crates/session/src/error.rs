//! Session error types.

/// Errors produced while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a transfer is already in progress")]
    Busy,

    #[error("archive error: {0}")]
    Archive(#[from] blobdrop_archive::ArchiveError),

    #[error("{0}")]
    Transfer(#[from] blobdrop_transfer::TransferError),

    #[error("settings error: {0}")]
    Settings(#[from] blobdrop_settings::SettingsError),
}
