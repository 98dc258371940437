//! Presentation-boundary contract for blobdrop.
//!
//! The front end (CLI today, any GUI tomorrow) talks to the session
//! controller exclusively through [`Request`] and [`Response`] values.
//! Both serialize as JSON objects tagged by `type`.

pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use messages::{Request, Response};
pub use types::{ConfigPatch, Configuration, TransferState, UpdateInfo, UploadReceipt, WebhookPayload};
