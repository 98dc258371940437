//! Session orchestration for the uploader.
//!
//! [`SessionController`] turns presentation [`Request`](blobdrop_protocol::Request)s
//! into archive, transfer, notify and update-check calls, and reports
//! every state change as a [`Response`](blobdrop_protocol::Response) on
//! its event channel.

mod controller;
mod error;

pub use controller::{SessionController, SessionState};
pub use error::SessionError;
