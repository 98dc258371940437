use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use blobdrop_protocol::{TransferState, UploadReceipt};

use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY};

/// Tuning knobs for a chunked upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Block size in bytes.
    pub chunk_size: usize,
    /// Maximum number of blocks staged at the same time.
    pub concurrency: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl TransferOptions {
    /// Replaces zero values with the defaults.
    pub fn normalized(self) -> Self {
        Self {
            chunk_size: if self.chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                self.chunk_size
            },
            concurrency: self.concurrency.max(1),
        }
    }
}

/// How an upload ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Every block was staged and the block list committed.
    Completed(UploadReceipt),
    /// The cancellation token fired; nothing was committed.
    Aborted,
}

/// Tracks the single active upload (thread-safe).
///
/// The session controller creates one per upload and discards it once it
/// reaches a terminal state.
pub struct TransferJob {
    inner: RwLock<JobInner>,
}

struct JobInner {
    id: String,
    destination_name: String,
    state: TransferState,
    total_bytes: u64,
    transferred_bytes: u64,
}

impl TransferJob {
    /// Creates a new pending job.
    pub fn new(destination_name: &str, total_bytes: u64) -> Self {
        Self {
            inner: RwLock::new(JobInner {
                id: uuid::Uuid::new_v4().to_string(),
                destination_name: destination_name.to_string(),
                state: TransferState::Pending,
                total_bytes,
                transferred_bytes: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, JobInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, JobInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the job as in-progress.
    pub fn start(&self) {
        self.write().state = TransferState::InProgress;
    }

    /// Records the running byte count. Never moves backwards.
    pub fn set_transferred(&self, transferred: u64) {
        let mut s = self.write();
        s.transferred_bytes = s.transferred_bytes.max(transferred.min(s.total_bytes));
    }

    /// Marks the job as completed.
    pub fn complete(&self) {
        let mut s = self.write();
        s.state = TransferState::Completed;
        s.transferred_bytes = s.total_bytes;
    }

    pub fn fail(&self) {
        self.write().state = TransferState::Failed;
    }

    /// Marks the job as aborted by the user.
    pub fn abort(&self) {
        self.write().state = TransferState::Aborted;
    }

    pub fn id(&self) -> String {
        self.read().id.clone()
    }

    pub fn destination_name(&self) -> String {
        self.read().destination_name.clone()
    }

    pub fn state(&self) -> TransferState {
        self.read().state
    }

    pub fn total_bytes(&self) -> u64 {
        self.read().total_bytes
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.read().transferred_bytes
    }
}
