//! Chunked block-blob uploads with progress tracking and cancellation.
//!
//! The blob SDK's block primitive does the heavy lifting: a file is
//! split into fixed-size blocks, each block is staged independently (with
//! bounded parallelism), and the block list is committed as one blob.
//! [`TransferClient`] drives that sequence, reports progress per completed
//! block and honours a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! between dispatches.

mod chunked;
mod client;
mod credentials;
pub mod memory;
mod progress;
mod store;
mod types;
mod validation;

pub use chunked::{Block, BlockReader, block_id};
pub use client::{AzureConnector, StoreConnector, TransferClient};
pub use credentials::StorageAccount;
pub use progress::ProgressReporter;
pub use store::{AzureBlockStore, BlockStore, BoxFuture, encode_blob_name};
pub use types::{TransferJob, TransferOptions, TransferOutcome};
pub use validation::validate_blob_name;

/// Default block size: 4 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Default number of blocks staged concurrently.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed ({status}): {detail}")]
    Auth { status: u16, detail: String },

    #[error("storage request failed: {0}")]
    Http(#[source] azure_core::Error),

    #[error("storage service returned {status}: {detail}")]
    Remote { status: u16, detail: String },

    #[error("invalid blob name: {0}")]
    InvalidBlobName(String),

    #[error("a transfer is already in progress")]
    Busy,
}
