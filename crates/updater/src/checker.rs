use std::time::Duration;

use blobdrop_protocol::UpdateInfo;
use tracing::{debug, info, warn};
use url::Url;

use crate::manifest::UpdateManifest;
use crate::platform::Platform;
use crate::version::is_newer;
use crate::UpdateError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Checks a release feed for newer versions.
pub struct UpdateChecker {
    http: reqwest::Client,
    feed_url: String,
}

impl UpdateChecker {
    /// Creates a checker for `feed_url`. An empty URL disables checks.
    pub fn new(feed_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(http, feed_url)
    }

    pub fn with_client(http: reqwest::Client, feed_url: &str) -> Self {
        Self {
            http,
            feed_url: feed_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.feed_url.is_empty()
    }

    /// URL of the manifest for `platform`.
    pub fn manifest_url(&self, platform: Platform) -> String {
        format!("{}/{}", self.feed_url, platform.manifest_name())
    }

    /// Returns the available update, or `None` when up to date, disabled,
    /// or the check failed. Failures are logged.
    pub async fn check(&self, platform: Platform, current_version: &str) -> Option<UpdateInfo> {
        match self.try_check(platform, current_version).await {
            Ok(update) => update,
            Err(e) => {
                warn!(feed = %self.feed_url, error = %e, "update check failed");
                None
            }
        }
    }

    /// Like [`check`](Self::check) but reports failures.
    pub async fn try_check(
        &self,
        platform: Platform,
        current_version: &str,
    ) -> Result<Option<UpdateInfo>, UpdateError> {
        if !self.is_enabled() {
            debug!("update feed not configured, skipping check");
            return Ok(None);
        }

        let manifest = self.fetch_manifest(platform).await?;
        if !is_newer(&manifest.version, current_version) {
            debug!(current = current_version, latest = %manifest.version, "up to date");
            return Ok(None);
        }

        let location = manifest
            .download_location()
            .ok_or_else(|| UpdateError::Manifest("manifest lists no files".into()))?;
        let download_url = self.resolve(location)?;
        info!(current = current_version, latest = %manifest.version, "update available");

        Ok(Some(UpdateInfo {
            latest_version: manifest.version,
            download_url,
        }))
    }

    async fn fetch_manifest(&self, platform: Platform) -> Result<UpdateManifest, UpdateError> {
        let url = self.manifest_url(platform);
        debug!(url = %url, "fetching update manifest");

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpdateError::Status {
                status: status.as_u16(),
                body,
            });
        }
        UpdateManifest::parse(&resp.text().await?)
    }

    /// Resolves a manifest file location against the feed directory.
    fn resolve(&self, location: &str) -> Result<String, UpdateError> {
        if let Ok(absolute) = Url::parse(location) {
            return Ok(absolute.to_string());
        }
        let base = Url::parse(&format!("{}/", self.feed_url))
            .map_err(|e| UpdateError::Config(format!("{}: {e}", self.feed_url)))?;
        base.join(location)
            .map(|u| u.to_string())
            .map_err(|e| UpdateError::Manifest(format!("bad file url {location}: {e}")))
    }
}
