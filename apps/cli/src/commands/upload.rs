//! `blobdrop upload`: one upload with a live progress line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use blobdrop_notifier::WebhookNotifier;
use blobdrop_protocol::Configuration;
use blobdrop_session::SessionController;
use blobdrop_settings::{JsonFileStore, SettingsStore};
use blobdrop_transfer::memory::{MemoryConnector, MemoryStore};
use blobdrop_transfer::{StorageAccount, TransferClient, TransferOptions, TransferOutcome};
use blobdrop_updater::UpdateChecker;

use super::TuningArgs;
use crate::output::ProgressPrinter;

#[derive(Args)]
pub struct UploadArgs {
    /// File or folder to upload
    pub path: PathBuf,

    /// Blob name (defaults to the file or archive name)
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub tuning: TuningArgs,

    /// Stage blocks in memory instead of contacting the storage service
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: UploadArgs, store: Arc<JsonFileStore>) -> anyhow::Result<()> {
    let options = TransferOptions::from(args.tuning);
    let transfer = if args.dry_run {
        dry_run_client(&store.load()?, options)?
    } else {
        TransferClient::azure(options)
    };

    let mut session = SessionController::new(
        store,
        transfer,
        WebhookNotifier::new()?,
        UpdateChecker::new(""),
    )?;
    let mut events = session
        .take_events()
        .context("session events already taken")?;
    let session = Arc::new(session);

    let upload = {
        let session = Arc::clone(&session);
        let path = args.path.clone();
        let name = args.name.clone();
        tokio::spawn(async move { session.upload(&path, name.as_deref()).await })
    };

    let mut printer = ProgressPrinter::new();
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());
    let mut aborting = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                printer.print(&event);
                if event.is_upload_terminal() {
                    break;
                }
            }
            _ = &mut ctrl_c, if !aborting => {
                aborting = true;
                eprintln!("\naborting...");
                session.abort();
            }
        }
    }

    match upload.await?.context("upload failed")? {
        TransferOutcome::Completed(receipt) => {
            println!("{}", receipt.blob_url);
            Ok(())
        }
        TransferOutcome::Aborted => anyhow::bail!("upload aborted"),
    }
}

/// A client that keeps blocks in memory, reporting blob URLs for the
/// configured account.
fn dry_run_client(config: &Configuration, options: TransferOptions) -> anyhow::Result<TransferClient> {
    let account = StorageAccount::from_connection_string(&config.connection_string)
        .context("dry run needs a valid connection string")?;
    let store = MemoryStore::new(&account.blob_endpoint, &config.container_name);
    Ok(TransferClient::new(
        Arc::new(MemoryConnector::new(Arc::new(store))),
        options,
    ))
}
