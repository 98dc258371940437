mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use blobdrop_settings::JsonFileStore;

/// Upload folders and files to blob storage.
#[derive(Parser)]
#[command(name = "blobdrop")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to <config dir>/blobdrop/config.json)
    #[arg(long, global = true, env = "BLOBDROP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the stored configuration
    Config {
        #[command(subcommand)]
        subcommand: commands::config::ConfigCommands,
    },
    /// Upload a file, or a folder as a zip archive
    Upload(commands::upload::UploadArgs),
    /// Check the release feed for a newer version
    CheckUpdate(commands::update::CheckUpdateArgs),
    /// Serve JSON requests on stdin and write responses to stdout, one per line
    Session(commands::session::SessionArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,blobdrop=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = Arc::new(match cli.config {
        Some(path) => JsonFileStore::new(path),
        None => JsonFileStore::default_location()?,
    });

    match cli.command {
        Commands::Config { subcommand } => commands::config::run(subcommand, &store),
        Commands::Upload(args) => commands::upload::run(args, store).await,
        Commands::CheckUpdate(args) => commands::update::run(args).await,
        Commands::Session(args) => commands::session::run(args, store).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_upload_flags() {
        let cli = Cli::try_parse_from([
            "blobdrop",
            "--config",
            "/tmp/c.json",
            "upload",
            "photos",
            "--name",
            "2024/photos.zip",
            "--chunk-size",
            "1048576",
            "--concurrency",
            "2",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(args.path, PathBuf::from("photos"));
                assert_eq!(args.name.as_deref(), Some("2024/photos.zip"));
                assert_eq!(args.tuning.chunk_size, 1_048_576);
                assert_eq!(args.tuning.concurrency, 2);
                assert!(args.dry_run);
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn upload_defaults() {
        let cli = Cli::try_parse_from(["blobdrop", "upload", "report.zip"]).unwrap();
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(args.tuning.chunk_size, blobdrop_transfer::DEFAULT_CHUNK_SIZE);
                assert_eq!(args.tuning.concurrency, blobdrop_transfer::DEFAULT_CONCURRENCY);
                assert!(!args.dry_run);
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn parses_config_set() {
        let cli = Cli::try_parse_from([
            "blobdrop",
            "config",
            "set",
            "--container",
            "photos",
            "--webhook",
            "https://hooks.example.com",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Config { .. }));
    }
}
