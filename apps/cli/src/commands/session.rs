//! `blobdrop session`: the request/response contract over stdio.
//!
//! Each stdin line is one JSON [`Request`]; each [`Response`] is written to
//! stdout as one JSON line. Lines that fail to parse are logged and skipped.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use blobdrop_notifier::WebhookNotifier;
use blobdrop_protocol::{Request, Response};
use blobdrop_session::SessionController;
use blobdrop_settings::JsonFileStore;
use blobdrop_transfer::TransferClient;
use blobdrop_updater::{Platform, UpdateChecker};

use super::TuningArgs;

#[derive(Args)]
pub struct SessionArgs {
    #[command(flatten)]
    pub tuning: TuningArgs,

    /// Release feed directory holding the latest*.yml manifests
    #[arg(long, env = "BLOBDROP_FEED_URL", default_value = "")]
    pub feed_url: String,
}

pub async fn run(args: SessionArgs, store: Arc<JsonFileStore>) -> anyhow::Result<()> {
    let mut session = SessionController::new(
        store,
        TransferClient::azure(args.tuning.into()),
        WebhookNotifier::new()?,
        UpdateChecker::new(&args.feed_url),
    )?
    .with_current_version(Platform::current(), env!("CARGO_PKG_VERSION"));
    let events = session
        .take_events()
        .context("session events already taken")?;

    let (tx, rx) = mpsc::channel(32);
    let runner = tokio::spawn(Arc::new(session).run(rx));
    let writer = tokio::spawn(write_responses(events, tokio::io::stdout()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(request) = parse_request(&line) {
            tx.send(request).await?;
        }
    }
    tracing::debug!("stdin closed, finishing session");

    drop(tx);
    runner.await?;
    writer.await??;
    Ok(())
}

fn parse_request(line: &str) -> Option<Request> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(request) => Some(request),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed request");
            None
        }
    }
}

/// Writes every response as one JSON line until the session closes.
async fn write_responses<W: AsyncWrite + Unpin>(
    mut events: mpsc::Receiver<Response>,
    mut out: W,
) -> anyhow::Result<()> {
    while let Some(event) = events.recv().await {
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}
