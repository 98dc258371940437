//! Session controller: one user, one active upload.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use blobdrop_protocol::{ConfigPatch, Configuration, Request, Response, WebhookPayload};
use blobdrop_notifier::WebhookNotifier;
use blobdrop_settings::SettingsStore;
use blobdrop_transfer::{TransferClient, TransferError, TransferJob, TransferOutcome};
use blobdrop_updater::{Platform, UpdateChecker};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::SessionError;

/// Where the session is in the upload lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Archiving,
    Uploading,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Archiving => "archiving",
            Self::Uploading => "uploading",
        })
    }
}

/// Upload bookkeeping shared with [`SessionController::abort`].
struct Flight {
    state: SessionState,
    job: Option<Arc<TransferJob>>,
    cancel: Option<CancellationToken>,
}

/// Orchestrates select → archive → upload → notify.
pub struct SessionController {
    settings: Arc<dyn SettingsStore>,
    transfer: TransferClient,
    notifier: WebhookNotifier,
    updater: UpdateChecker,
    platform: Platform,
    current_version: String,
    config: Mutex<Configuration>,
    flight: Mutex<Flight>,
    events_tx: mpsc::Sender<Response>,
    events_rx: Option<mpsc::Receiver<Response>>,
}

impl SessionController {
    /// Creates a controller, loading the stored configuration.
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        transfer: TransferClient,
        notifier: WebhookNotifier,
        updater: UpdateChecker,
    ) -> Result<Self, SessionError> {
        let config = settings.load()?;
        let (events_tx, events_rx) = mpsc::channel(256);
        Ok(Self {
            settings,
            transfer,
            notifier,
            updater,
            platform: Platform::current(),
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            config: Mutex::new(config),
            flight: Mutex::new(Flight {
                state: SessionState::Idle,
                job: None,
                cancel: None,
            }),
            events_tx,
            events_rx: Some(events_rx),
        })
    }

    /// Sets the version and platform update checks compare against.
    pub fn with_current_version(mut self, platform: Platform, version: &str) -> Self {
        self.platform = platform;
        self.current_version = version.to_string();
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<Response>> {
        self.events_rx.take()
    }

    pub fn state(&self) -> SessionState {
        lock(&self.flight).state
    }

    /// The upload in progress, if any.
    pub fn current_job(&self) -> Option<Arc<TransferJob>> {
        lock(&self.flight).job.clone()
    }

    pub fn config(&self) -> Configuration {
        lock(&self.config).clone()
    }

    /// Handles one request. Uploads run to completion before this returns;
    /// use [`run`](Self::run) to keep serving `abort` meanwhile.
    pub async fn handle(&self, request: Request) {
        debug!(request = request.name(), "handling request");
        match request {
            Request::GetConfig => {
                let config = self.config();
                self.emit(Response::InitialConfig { config }).await;
            }
            Request::SelectFolder { path } => {
                let path = existing(&path, |m| m.is_dir()).await;
                self.emit(Response::FolderSelected { path }).await;
            }
            Request::SelectFile { path } => {
                let path = existing(&path, |m| m.is_file()).await;
                self.emit(Response::FileSelected { path }).await;
            }
            Request::UpdateConfig { config } => {
                if let Err(e) = self.update_config(config).await {
                    error!(error = %e, "failed to persist configuration");
                }
            }
            Request::Upload {
                path,
                destination_name,
            } => {
                // The outcome already went out as an upload event.
                if let Err(e) = self
                    .upload(Path::new(&path), destination_name.as_deref())
                    .await
                {
                    debug!(error = %e, "upload request ended with an error");
                }
            }
            Request::Abort => self.abort(),
            Request::CheckForUpdates => {
                let update = self
                    .updater
                    .check(self.platform, &self.current_version)
                    .await;
                self.emit(Response::CheckForUpdatesResult { update }).await;
            }
        }
    }

    /// Serves requests until the channel closes, running uploads in the
    /// background so `abort` is handled while one is in flight.
    pub async fn run(self: Arc<Self>, mut requests: mpsc::Receiver<Request>) {
        let mut uploads = JoinSet::new();
        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(request @ Request::Upload { .. }) => {
                        let session = Arc::clone(&self);
                        uploads.spawn(async move { session.handle(request).await });
                    }
                    Some(request) => self.handle(request).await,
                    None => break,
                },
                Some(_) = uploads.join_next(), if !uploads.is_empty() => {}
            }
        }
        while uploads.join_next().await.is_some() {}
        debug!("request channel closed");
    }

    /// Applies `patch`, persists the result and emits `configUpdated`.
    ///
    /// The in-memory configuration is updated even when saving fails.
    pub async fn update_config(&self, patch: ConfigPatch) -> Result<Configuration, SessionError> {
        let config = {
            let mut config = lock(&self.config);
            config.apply(patch);
            config.clone()
        };
        let saved = self.settings.save(&config);
        self.emit(Response::ConfigUpdated {
            config: config.clone(),
        })
        .await;
        saved?;
        info!("configuration updated");
        Ok(config)
    }

    /// Cancels the upload in flight. Does nothing when idle.
    pub fn abort(&self) {
        let flight = lock(&self.flight);
        match &flight.cancel {
            Some(token) => {
                info!(
                    state = %flight.state,
                    transfer_active = self.transfer.is_active(),
                    "aborting upload"
                );
                token.cancel();
                self.transfer.abort();
            }
            None => debug!("abort requested while idle"),
        }
    }

    /// Uploads `path`, zipping it first when it is a directory.
    ///
    /// Every call ends with exactly one of `uploadFinished`, `uploadFailed`
    /// or `uploadAborted` on the event channel.
    pub async fn upload(
        &self,
        path: &Path,
        destination_name: Option<&str>,
    ) -> Result<TransferOutcome, SessionError> {
        let result = self.run_upload(path, destination_name).await;
        match &result {
            Ok(TransferOutcome::Completed(receipt)) => {
                self.emit(Response::UploadFinished {
                    request_id: receipt.request_id.clone(),
                    blob_url: receipt.blob_url.clone(),
                })
                .await;
                self.notify_webhook(&receipt.blob_url).await;
            }
            Ok(TransferOutcome::Aborted) => self.emit(Response::UploadAborted).await,
            Err(e) => {
                error!(path = %path.display(), error = %e, "upload failed");
                self.emit(Response::UploadFailed {
                    error: e.to_string(),
                })
                .await;
            }
        }
        result
    }

    async fn run_upload(
        &self,
        path: &Path,
        destination_name: Option<&str>,
    ) -> Result<TransferOutcome, SessionError> {
        let (_flight, cancel) = FlightGuard::begin(&self.flight)?;

        let metadata = tokio::fs::metadata(path).await.map_err(TransferError::from)?;
        let file_path = if metadata.is_dir() {
            self.set_state(SessionState::Archiving);
            info!(source = %path.display(), "archiving folder");
            let archive = blobdrop_archive::archive_directory(path).await?;
            self.emit(Response::FolderCompressed {
                archive_path: archive.display().to_string(),
            })
            .await;
            archive
        } else {
            path.to_path_buf()
        };
        if cancel.is_cancelled() {
            return Ok(TransferOutcome::Aborted);
        }

        let destination = match destination_name.filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => file_name(&file_path)?,
        };
        let total = tokio::fs::metadata(&file_path)
            .await
            .map_err(TransferError::from)?
            .len();

        let job = Arc::new(TransferJob::new(&destination, total));
        job.start();
        info!(
            job = %job.id(),
            blob = %job.destination_name(),
            total_bytes = job.total_bytes(),
            "transfer job started"
        );
        {
            let mut flight = lock(&self.flight);
            flight.state = SessionState::Uploading;
            flight.job = Some(Arc::clone(&job));
        }

        // Last count that made it onto the channel; u64::MAX until one does.
        let delivered = Arc::new(AtomicU64::new(u64::MAX));
        let on_progress = {
            let job = Arc::clone(&job);
            let delivered = Arc::clone(&delivered);
            let tx = self.events_tx.clone();
            move |transferred, total| {
                job.set_transferred(transferred);
                // Intermediate counts are dropped when the consumer lags.
                let sent = tx.try_send(Response::UploadProgress {
                    transferred_bytes: transferred,
                    total_bytes: total,
                });
                if sent.is_ok() {
                    delivered.store(transferred, Ordering::Release);
                }
            }
        };

        let config = self.config();
        let outcome = self
            .transfer
            .upload(&config, &file_path, &destination, on_progress, cancel)
            .await;
        match &outcome {
            Ok(TransferOutcome::Completed(_)) => {
                job.complete();
                // The closing (total, total) count is never lost.
                if delivered.load(Ordering::Acquire) != total {
                    self.emit(Response::UploadProgress {
                        transferred_bytes: total,
                        total_bytes: total,
                    })
                    .await;
                }
            }
            Ok(TransferOutcome::Aborted) => job.abort(),
            Err(_) => job.fail(),
        }
        debug_assert!(job.state().is_terminal());
        info!(
            job = %job.id(),
            state = ?job.state(),
            transferred_bytes = job.transferred_bytes(),
            "transfer job ended"
        );
        outcome.map_err(SessionError::from)
    }

    /// Posts the finished blob URL to the configured webhook. Failures are
    /// logged by the notifier and never reach the caller.
    async fn notify_webhook(&self, blob_url: &str) {
        let webhook = lock(&self.config).webhook.clone();
        let payload = WebhookPayload {
            blob_url: blob_url.to_string(),
        };
        self.notifier.notify(&webhook, &payload).await;
    }

    fn set_state(&self, state: SessionState) {
        lock(&self.flight).state = state;
    }

    async fn emit(&self, response: Response) {
        if self.events_tx.send(response).await.is_err() {
            warn!("event receiver dropped");
        }
    }
}

/// Marks the session busy for the duration of an upload and returns it to
/// idle when dropped.
struct FlightGuard<'a> {
    flight: &'a Mutex<Flight>,
}

impl<'a> FlightGuard<'a> {
    fn begin(flight: &'a Mutex<Flight>) -> Result<(Self, CancellationToken), SessionError> {
        let mut f = lock(flight);
        if f.state != SessionState::Idle {
            return Err(SessionError::Busy);
        }
        let cancel = CancellationToken::new();
        f.state = SessionState::Uploading;
        f.cancel = Some(cancel.clone());
        Ok((Self { flight }, cancel))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut f = lock(self.flight);
        f.state = SessionState::Idle;
        f.job = None;
        f.cancel = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `Some(path)` when `path` exists and passes `kind`.
async fn existing(path: &str, kind: impl Fn(&std::fs::Metadata) -> bool) -> Option<String> {
    match tokio::fs::metadata(path).await {
        Ok(m) if kind(&m) => Some(path.to_string()),
        _ => None,
    }
}

fn file_name(path: &Path) -> Result<String, SessionError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            TransferError::InvalidBlobName(format!("{} has no file name", path.display())).into()
        })
}
