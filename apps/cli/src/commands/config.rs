//! `blobdrop config`: inspect and edit the stored configuration.

use clap::{Args, Subcommand};

use blobdrop_protocol::{ConfigPatch, Configuration};
use blobdrop_settings::{JsonFileStore, SettingsStore};

/// Keys whose values are never printed in full.
const SECRET_KEYS: [&str; 2] = ["accountkey", "sharedaccesssignature"];

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the stored configuration
    Show {
        /// Print secrets in the connection string as stored
        #[arg(long)]
        reveal: bool,
    },
    /// Change one or more fields
    Set(SetArgs),
    /// Print the configuration file location
    Path,
}

#[derive(Args)]
pub struct SetArgs {
    /// Storage connection string (SAS or account key)
    #[arg(long)]
    connection_string: Option<String>,

    /// Target container
    #[arg(long)]
    container: Option<String>,

    /// Public base URL for reported blob URLs
    #[arg(long)]
    url: Option<String>,

    /// Webhook notified after each upload
    #[arg(long)]
    webhook: Option<String>,
}

impl From<SetArgs> for ConfigPatch {
    fn from(args: SetArgs) -> Self {
        ConfigPatch {
            connection_string: args.connection_string,
            container_name: args.container,
            url: args.url,
            webhook: args.webhook,
        }
    }
}

pub fn run(cmd: ConfigCommands, store: &JsonFileStore) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show { reveal } => {
            let mut config = store.load()?;
            if !reveal {
                config.connection_string = redact(&config.connection_string);
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Set(args) => {
            let patch = ConfigPatch::from(args);
            if patch.is_empty() {
                anyhow::bail!("nothing to change; pass at least one field");
            }
            let config: Configuration = store.update(patch)?;
            tracing::info!(path = %store.path().display(), "configuration saved");
            println!(
                "{}",
                serde_json::to_string_pretty(&Configuration {
                    connection_string: redact(&config.connection_string),
                    ..config
                })?
            );
        }
        ConfigCommands::Path => println!("{}", store.path().display()),
    }
    Ok(())
}

/// Masks the secret parts of a connection string.
fn redact(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, _)) if SECRET_KEYS.contains(&key.trim().to_ascii_lowercase().as_str()) => {
                format!("{key}=***")
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn redacts_secrets() {
        assert_eq!(
            redact("AccountName=acct;AccountKey=a2V5eQ==;EndpointSuffix=core.windows.net"),
            "AccountName=acct;AccountKey=***;EndpointSuffix=core.windows.net"
        );
        assert_eq!(
            redact("BlobEndpoint=https://acct.blob.core.windows.net;SharedAccessSignature=sv=1&sig=x"),
            "BlobEndpoint=https://acct.blob.core.windows.net;SharedAccessSignature=***"
        );
        assert_eq!(redact(""), "");
    }

    #[test]
    fn set_updates_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("config.json"));
        let args = SetArgs {
            connection_string: None,
            container: Some("photos".into()),
            url: None,
            webhook: None,
        };
        run(ConfigCommands::Set(args), &store).unwrap();
        assert_eq!(store.load().unwrap().container_name, "photos");
    }

    #[test]
    fn empty_set_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("config.json"));
        let args = SetArgs {
            connection_string: None,
            container: None,
            url: None,
            webhook: None,
        };
        assert!(run(ConfigCommands::Set(args), &store).is_err());
    }
}
