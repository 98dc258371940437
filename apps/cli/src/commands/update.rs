//! `blobdrop check-update`.

use clap::Args;

use blobdrop_updater::{Platform, UpdateChecker};

#[derive(Args)]
pub struct CheckUpdateArgs {
    /// Release feed directory holding the latest*.yml manifests
    #[arg(long, env = "BLOBDROP_FEED_URL", default_value = "")]
    pub feed_url: String,
}

pub async fn run(args: CheckUpdateArgs) -> anyhow::Result<()> {
    let checker = UpdateChecker::new(&args.feed_url);
    if !checker.is_enabled() {
        anyhow::bail!("no update feed configured; pass --feed-url or set BLOBDROP_FEED_URL");
    }

    let current = env!("CARGO_PKG_VERSION");
    match checker.try_check(Platform::current(), current).await? {
        Some(update) => {
            println!("blobdrop {} is available (running {current})", update.latest_version);
            println!("{}", update.download_url);
        }
        None => println!("blobdrop {current} is up to date"),
    }
    Ok(())
}
