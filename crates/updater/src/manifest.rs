use serde::Deserialize;

use crate::UpdateError;

/// A `latest*.yml` release manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateManifest {
    pub version: String,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
    /// Legacy single-file location.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sha512: Option<String>,
    #[serde(default, rename = "releaseDate")]
    pub release_date: Option<String>,
}

/// One downloadable artifact of a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestFile {
    pub url: String,
    #[serde(default)]
    pub sha512: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl UpdateManifest {
    /// Parses manifest YAML.
    pub fn parse(yaml: &str) -> Result<Self, UpdateError> {
        let manifest: Self =
            serde_yaml::from_str(yaml).map_err(|e| UpdateError::Manifest(e.to_string()))?;
        if manifest.version.trim().is_empty() {
            return Err(UpdateError::Manifest("version is empty".into()));
        }
        Ok(manifest)
    }

    /// Location of the primary download: the first listed file, or the
    /// legacy `path` field.
    pub fn download_location(&self) -> Option<&str> {
        self.files
            .first()
            .map(|f| f.url.as_str())
            .or(self.path.as_deref())
            .filter(|u| !u.trim().is_empty())
    }
}
