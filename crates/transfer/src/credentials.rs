//! Storage connection strings.
//!
//! Parsing and credential construction are left to the storage SDK; this
//! module only resolves which blob endpoint and account the string names.

use azure_storage::{ConnectionString, StorageCredentials};
use url::Url;

use crate::TransferError;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Account, blob endpoint and credentials named by a connection string.
pub struct StorageAccount {
    pub account: String,
    /// Blob service endpoint, without a trailing slash.
    pub blob_endpoint: String,
    pub credentials: StorageCredentials,
}

impl StorageAccount {
    /// Resolves a `Key=Value;...` connection string.
    ///
    /// The endpoint is `BlobEndpoint` when present, otherwise it is built
    /// from `AccountName`, `DefaultEndpointsProtocol` and `EndpointSuffix`.
    pub fn from_connection_string(input: &str) -> Result<Self, TransferError> {
        if input.trim().is_empty() {
            return Err(TransferError::Config("connection string is empty".into()));
        }
        let cs = ConnectionString::new(input.trim()).map_err(invalid)?;
        let credentials = cs.storage_credentials().map_err(invalid)?;

        let endpoint = match (cs.blob_endpoint, cs.account_name) {
            (Some(endpoint), _) => endpoint.to_string(),
            (None, Some(account)) => {
                let protocol = cs
                    .default_endpoints_protocol
                    .map_or_else(|| "https".to_string(), |p| p.to_string());
                let suffix = cs.endpoint_suffix.unwrap_or(DEFAULT_ENDPOINT_SUFFIX);
                format!("{protocol}://{account}.blob.{suffix}")
            }
            (None, None) => {
                return Err(TransferError::Config(
                    "connection string has neither BlobEndpoint nor AccountName".into(),
                ));
            }
        };

        let url = Url::parse(&endpoint)
            .map_err(|e| TransferError::Config(format!("invalid blob endpoint {endpoint}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransferError::Config(format!(
                "unsupported blob endpoint scheme: {}",
                url.scheme()
            )));
        }

        let account = match cs.account_name {
            Some(account) => account.to_string(),
            None => account_from_host(&url)?,
        };

        Ok(Self {
            account,
            blob_endpoint: endpoint.trim_end_matches('/').to_string(),
            credentials,
        })
    }
}

/// `acct` from `acct.blob.core.windows.net`.
fn account_from_host(url: &Url) -> Result<String, TransferError> {
    url.host_str()
        .and_then(|host| host.split('.').next())
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TransferError::Config(format!("cannot tell the account name from {url}")))
}

fn invalid(err: azure_core::Error) -> TransferError {
    TransferError::Config(format!("invalid connection string: {err}"))
}
