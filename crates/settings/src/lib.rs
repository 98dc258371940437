//! Persisted uploader configuration.
//!
//! The configuration lives in `<config dir>/blobdrop/config.json`:
//! - Linux: `$XDG_CONFIG_HOME` or `~/.config`
//! - macOS: `~/Library/Application Support`
//! - Windows: `%APPDATA%`

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use blobdrop_protocol::{ConfigPatch, Configuration};

const APP_DIR: &str = "blobdrop";
const CONFIG_FILE: &str = "config.json";

/// Errors from loading or saving settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no configuration directory could be determined")]
    NoConfigDir,
}

/// Loads and saves the single [`Configuration`].
pub trait SettingsStore: Send + Sync {
    /// Reads the stored configuration. Nothing stored yet yields the defaults.
    fn load(&self) -> Result<Configuration, SettingsError>;

    fn save(&self, config: &Configuration) -> Result<(), SettingsError>;

    /// Applies `patch` to the stored configuration and returns the result.
    fn update(&self, patch: ConfigPatch) -> Result<Configuration, SettingsError> {
        let mut config = self.load()?;
        config.apply(patch);
        self.save(&config)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// Settings stored as pretty-printed JSON, readable only by the owner.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location.
    pub fn default_location() -> Result<Self, SettingsError> {
        Ok(Self::new(default_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Configuration, SettingsError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no configuration file, using defaults");
                return Ok(Configuration::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, config: &Configuration) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;

        let partial = self.path.with_extension("json.partial");
        std::fs::write(&partial, json)?;
        set_permissions_0600(&partial);
        std::fs::rename(&partial, &self.path)?;

        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// `<config dir>/blobdrop/config.json`.
pub fn default_config_path() -> Result<PathBuf, SettingsError> {
    Ok(config_base_dir()?.join(APP_DIR).join(CONFIG_FILE))
}

fn non_empty_env(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn config_base_dir() -> Result<PathBuf, SettingsError> {
    #[cfg(target_os = "windows")]
    {
        non_empty_env("APPDATA").ok_or(SettingsError::NoConfigDir)
    }

    #[cfg(target_os = "macos")]
    {
        non_empty_env("HOME")
            .map(|home| home.join("Library").join("Application Support"))
            .ok_or(SettingsError::NoConfigDir)
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        non_empty_env("XDG_CONFIG_HOME")
            .or_else(|| non_empty_env("HOME").map(|home| home.join(".config")))
            .ok_or(SettingsError::NoConfigDir)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Settings kept only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStore {
    config: Mutex<Configuration>,
}

impl MemoryStore {
    pub fn new(config: Configuration) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Configuration, SettingsError> {
        Ok(self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, config: &Configuration) -> Result<(), SettingsError> {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config.clone();
        Ok(())
    }
}
