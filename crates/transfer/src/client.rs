//! Upload orchestration over a [`BlockStore`].

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use blobdrop_protocol::{Configuration, UploadReceipt};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chunked::BlockReader;
use crate::credentials::StorageAccount;
use crate::progress::ProgressReporter;
use crate::store::{AzureBlockStore, BlockStore, content_type_for, encode_blob_name};
use crate::types::{TransferOptions, TransferOutcome};
use crate::validation::validate_blob_name;
use crate::TransferError;

/// Builds a [`BlockStore`] for a connection string and container.
pub trait StoreConnector: Send + Sync {
    fn connect(
        &self,
        connection_string: &str,
        container: &str,
    ) -> Result<Arc<dyn BlockStore>, TransferError>;
}

/// Connects to the blob service through the storage SDK.
#[derive(Default)]
pub struct AzureConnector;

impl AzureConnector {
    pub fn new() -> Self {
        Self
    }
}

impl StoreConnector for AzureConnector {
    fn connect(
        &self,
        connection_string: &str,
        container: &str,
    ) -> Result<Arc<dyn BlockStore>, TransferError> {
        let account = StorageAccount::from_connection_string(connection_string)?;
        debug!(endpoint = %account.blob_endpoint, container, "connecting to blob service");
        Ok(Arc::new(AzureBlockStore::new(account, container)))
    }
}

struct CachedStore {
    connection_string: String,
    container: String,
    store: Arc<dyn BlockStore>,
}

/// Result of one staging task: the block size, or `None` when cancelled.
type StageResult = Result<Option<u64>, TransferError>;

/// Chunked uploader with single-flight semantics.
///
/// At most one upload runs at a time; [`TransferClient::abort`] cancels it
/// from any task.
pub struct TransferClient {
    connector: Arc<dyn StoreConnector>,
    options: TransferOptions,
    cached: Mutex<Option<CachedStore>>,
    active: Mutex<Option<CancellationToken>>,
}

impl TransferClient {
    /// Creates a client that builds stores through `connector`.
    pub fn new(connector: Arc<dyn StoreConnector>, options: TransferOptions) -> Self {
        Self {
            connector,
            options: options.normalized(),
            cached: Mutex::new(None),
            active: Mutex::new(None),
        }
    }

    /// Creates a client for the blob service.
    pub fn azure(options: TransferOptions) -> Self {
        Self::new(Arc::new(AzureConnector::new()), options)
    }

    /// Whether an upload is running.
    pub fn is_active(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Cancels the running upload. Does nothing when idle.
    pub fn abort(&self) {
        if let Some(token) = lock(&self.active).as_ref() {
            info!("abort requested");
            token.cancel();
        }
    }

    /// Uploads `path` as the block blob `destination_name`.
    ///
    /// `on_progress(transferred, total)` is called once per staged block
    /// with a non-decreasing count; a zero-byte file reports `(0, 0)` once.
    /// Cancelling `cancel` (or calling [`abort`](Self::abort)) stops
    /// dispatching, drops in-flight requests and returns
    /// [`TransferOutcome::Aborted`] without committing anything.
    pub async fn upload<F>(
        &self,
        config: &Configuration,
        path: &Path,
        destination_name: &str,
        on_progress: F,
        cancel: CancellationToken,
    ) -> Result<TransferOutcome, TransferError>
    where
        F: FnMut(u64, u64) + Send,
    {
        validate_blob_name(destination_name)?;
        let _active = ActiveGuard::acquire(&self.active, &cancel)?;
        let store = self.store_for(config)?;

        let mut reader = BlockReader::open(path, self.options.chunk_size).await?;
        let total = reader.file_size();
        info!(
            path = %path.display(),
            blob = destination_name,
            total_bytes = total,
            blocks = reader.block_count(),
            "upload started"
        );

        let mut progress = ProgressReporter::new(total, on_progress);
        // Halts dispatching on user cancel and on the first failure.
        let halt = cancel.child_token();
        let mut failure: Option<TransferError> = None;
        let mut block_ids = Vec::with_capacity(reader.block_count());
        let mut tasks: JoinSet<StageResult> = JoinSet::new();

        while !halt.is_cancelled() {
            while tasks.len() >= self.options.concurrency {
                if let Some(res) = tasks.join_next().await {
                    settle(res, &halt, &mut failure, &mut progress);
                }
            }
            if halt.is_cancelled() {
                break;
            }

            let block = match reader.next_block().await {
                Ok(Some(block)) => block,
                Ok(None) => break,
                Err(e) => {
                    failure.get_or_insert(e);
                    halt.cancel();
                    break;
                }
            };
            debug!(index = block.index, offset = block.offset, len = block.data.len(), "staging block");
            block_ids.push(block.id.clone());

            let store = Arc::clone(&store);
            let blob = destination_name.to_string();
            let token = halt.clone();
            tasks.spawn(async move {
                let size = block.data.len() as u64;
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Ok(None),
                    res = store.stage_block(&blob, &block.id, block.data) => res.map(|()| Some(size)),
                }
            });
        }

        while let Some(res) = tasks.join_next().await {
            settle(res, &halt, &mut failure, &mut progress);
        }

        if cancel.is_cancelled() {
            info!(blob = destination_name, "upload aborted");
            return Ok(TransferOutcome::Aborted);
        }
        if let Some(e) = failure {
            warn!(blob = destination_name, error = %e, "upload failed");
            return Err(e);
        }
        if total == 0 {
            progress.report();
        }

        let request_id = store
            .commit_blocks(destination_name, &block_ids, content_type_for(destination_name))
            .await?;
        let blob_url = public_blob_url(config, store.as_ref(), destination_name);
        info!(blob = destination_name, request_id = %request_id, url = %blob_url, "upload committed");

        Ok(TransferOutcome::Completed(UploadReceipt {
            request_id,
            blob_url,
        }))
    }

    /// Returns the cached store, rebuilding it when the credentials or
    /// container changed.
    fn store_for(&self, config: &Configuration) -> Result<Arc<dyn BlockStore>, TransferError> {
        if config.connection_string.trim().is_empty() {
            return Err(TransferError::Config("connection string is not set".into()));
        }
        if config.container_name.trim().is_empty() {
            return Err(TransferError::Config("container name is not set".into()));
        }

        let mut cached = lock(&self.cached);
        if let Some(hit) = cached.as_ref().filter(|c| {
            c.connection_string == config.connection_string && c.container == config.container_name
        }) {
            return Ok(Arc::clone(&hit.store));
        }

        let store = self
            .connector
            .connect(&config.connection_string, &config.container_name)?;
        *cached = Some(CachedStore {
            connection_string: config.connection_string.clone(),
            container: config.container_name.clone(),
            store: Arc::clone(&store),
        });
        Ok(store)
    }
}

/// Folds one finished staging task into the upload state.
fn settle<F: FnMut(u64, u64)>(
    res: Result<StageResult, JoinError>,
    halt: &CancellationToken,
    failure: &mut Option<TransferError>,
    progress: &mut ProgressReporter<F>,
) {
    match res {
        Ok(Ok(Some(size))) => {
            if !halt.is_cancelled() {
                progress.advance(size);
            }
        }
        Ok(Ok(None)) => {}
        Ok(Err(e)) => {
            failure.get_or_insert(e);
            halt.cancel();
        }
        Err(e) => {
            failure.get_or_insert(TransferError::Io(std::io::Error::other(e)));
            halt.cancel();
        }
    }
}

/// `<url>/<container>/<blob>` when a public base URL is configured,
/// otherwise the store's own URL.
fn public_blob_url(config: &Configuration, store: &dyn BlockStore, blob: &str) -> String {
    let base = config.url.trim().trim_end_matches('/');
    if base.is_empty() {
        store.blob_url(blob)
    } else {
        format!("{base}/{}/{}", config.container_name, encode_blob_name(blob))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registers the running upload's token and clears it on drop.
struct ActiveGuard<'a> {
    slot: &'a Mutex<Option<CancellationToken>>,
}

impl<'a> ActiveGuard<'a> {
    fn acquire(
        slot: &'a Mutex<Option<CancellationToken>>,
        token: &CancellationToken,
    ) -> Result<Self, TransferError> {
        let mut active = lock(slot);
        if active.is_some() {
            return Err(TransferError::Busy);
        }
        *active = Some(token.clone());
        Ok(Self { slot })
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        *lock(self.slot) = None;
    }
}
