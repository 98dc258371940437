//! In-memory block store.
//!
//! Behaves like the storage service's block primitive without any network:
//! staged blocks are kept per blob and assembled on commit. Used by the test
//! suites and by the CLI's `--dry-run` mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use crate::TransferError;
use crate::client::StoreConnector;
use crate::store::{BlockStore, BoxFuture, encode_blob_name};

/// A blob whose block list has been committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedBlob {
    pub data: Vec<u8>,
    pub content_type: String,
    pub block_ids: Vec<String>,
}

#[derive(Default)]
struct MemoryState {
    staged: HashMap<String, HashMap<String, Vec<u8>>>,
    committed: HashMap<String, CommittedBlob>,
    stage_calls: usize,
}

/// Block store that keeps everything in memory.
pub struct MemoryStore {
    endpoint: String,
    container: String,
    request_id: String,
    stage_delay: Option<Duration>,
    fail_block: Option<String>,
    state: Mutex<MemoryState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    stage_started: Notify,
}

impl MemoryStore {
    /// Creates an empty store whose blob URLs live under `endpoint/container`.
    pub fn new(endpoint: &str, container: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            container: container.to_string(),
            request_id: "memory-request".into(),
            stage_delay: None,
            fail_block: None,
            state: Mutex::new(MemoryState::default()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            stage_started: Notify::new(),
        }
    }

    /// Delays every stage call by `delay`.
    pub fn with_stage_delay(mut self, delay: Duration) -> Self {
        self.stage_delay = Some(delay);
        self
    }

    /// Makes staging the block with `block_id` fail with a 500.
    pub fn with_failing_block(mut self, block_id: impl Into<String>) -> Self {
        self.fail_block = Some(block_id.into());
        self
    }

    /// Request id returned from commits.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The committed blob named `blob`, if any.
    pub fn committed(&self, blob: &str) -> Option<CommittedBlob> {
        self.lock().committed.get(blob).cloned()
    }

    /// Number of uncommitted blocks staged for `blob`.
    pub fn staged_count(&self, blob: &str) -> usize {
        self.lock().staged.get(blob).map_or(0, HashMap::len)
    }

    /// Total number of stage calls received, including failed and dropped ones.
    pub fn stage_calls(&self) -> usize {
        self.lock().stage_calls
    }

    /// Highest number of stage calls that were running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Waits until a stage call has started since the last wait.
    pub async fn stage_started(&self) {
        self.stage_started.notified().await;
    }
}

/// Tracks one running stage call; released on drop so cancelled calls count too.
struct InFlight<'a>(&'a MemoryStore);

impl<'a> InFlight<'a> {
    fn enter(store: &'a MemoryStore) -> Self {
        let now = store.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        store.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(store)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl BlockStore for MemoryStore {
    fn stage_block<'a>(
        &'a self,
        blob: &'a str,
        block_id: &'a str,
        data: Vec<u8>,
    ) -> BoxFuture<'a, Result<(), TransferError>> {
        Box::pin(async move {
            let _in_flight = InFlight::enter(self);
            self.lock().stage_calls += 1;
            self.stage_started.notify_one();

            if let Some(delay) = self.stage_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_block.as_deref() == Some(block_id) {
                return Err(TransferError::Remote {
                    status: 500,
                    detail: format!("injected failure for block {block_id}"),
                });
            }

            self.lock()
                .staged
                .entry(blob.to_string())
                .or_default()
                .insert(block_id.to_string(), data);
            Ok(())
        })
    }

    fn commit_blocks<'a>(
        &'a self,
        blob: &'a str,
        block_ids: &'a [String],
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, TransferError>> {
        Box::pin(async move {
            let mut state = self.lock();
            let staged = state.staged.remove(blob).unwrap_or_default();

            let mut data = Vec::new();
            for id in block_ids {
                let block = staged.get(id).ok_or_else(|| TransferError::Remote {
                    status: 400,
                    detail: format!("InvalidBlockList: block {id} was never staged"),
                })?;
                data.extend_from_slice(block);
            }

            state.committed.insert(
                blob.to_string(),
                CommittedBlob {
                    data,
                    content_type: content_type.to_string(),
                    block_ids: block_ids.to_vec(),
                },
            );
            Ok(self.request_id.clone())
        })
    }

    fn blob_url(&self, blob: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            self.container,
            encode_blob_name(blob)
        )
    }
}

/// Connector that always hands out the same [`MemoryStore`].
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
    connects: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// How many times a store handle was requested.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl StoreConnector for MemoryConnector {
    fn connect(
        &self,
        _connection_string: &str,
        _container: &str,
    ) -> Result<Arc<dyn BlockStore>, TransferError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.store) as Arc<dyn BlockStore>)
    }
}
