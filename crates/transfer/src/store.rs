//! Block-blob storage primitive.
//!
//! [`BlockStore`] is the seam between the upload orchestration and the
//! storage service: stage a block, commit a block list. [`AzureBlockStore`]
//! delegates both to the blob SDK; tests and dry runs use
//! [`crate::memory::MemoryStore`].

use std::future::Future;
use std::pin::Pin;

use azure_core::error::ErrorKind;
use azure_storage::CloudLocation;
use azure_storage_blobs::prelude::{BlobBlockType, BlockId, BlockList, ClientBuilder, ContainerClient};
use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::TransferError;
use crate::credentials::StorageAccount;

/// Characters escaped in blob names; `/` stays literal as a virtual folder separator.
const BLOB_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Boxed future returned by [`BlockStore`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Abstract block-blob container.
pub trait BlockStore: Send + Sync {
    /// Uploads one uncommitted block of `blob`.
    fn stage_block<'a>(
        &'a self,
        blob: &'a str,
        block_id: &'a str,
        data: Vec<u8>,
    ) -> BoxFuture<'a, Result<(), TransferError>>;

    /// Commits `block_ids`, in order, as the content of `blob`.
    ///
    /// Returns the service request id.
    fn commit_blocks<'a>(
        &'a self,
        blob: &'a str,
        block_ids: &'a [String],
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, TransferError>>;

    /// Service URL of `blob`, without credentials.
    fn blob_url(&self, blob: &str) -> String;
}

/// Percent-encodes a blob name for use in a URL path.
pub fn encode_blob_name(blob: &str) -> String {
    utf8_percent_encode(blob, BLOB_NAME_ENCODE_SET).to_string()
}

/// Content type recorded on the committed blob, by file extension.
pub(crate) fn content_type_for(blob: &str) -> &'static str {
    let ext = blob
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",
        "rar" => "application/vnd.rar",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// AzureBlockStore
// ---------------------------------------------------------------------------

/// Block store backed by the blob SDK's Put Block / Put Block List calls.
pub struct AzureBlockStore {
    container: ContainerClient,
    /// `<endpoint>/<container>`, no trailing slash.
    container_url: String,
}

impl AzureBlockStore {
    /// Creates a store for `container` in the resolved storage account.
    pub fn new(account: StorageAccount, container: &str) -> Self {
        let container_url = format!("{}/{}", account.blob_endpoint, container);
        let location = CloudLocation::Custom {
            account: account.account,
            uri: account.blob_endpoint,
        };
        let container = ClientBuilder::with_location(location, account.credentials)
            .container_client(container);
        Self {
            container,
            container_url,
        }
    }
}

impl BlockStore for AzureBlockStore {
    fn stage_block<'a>(
        &'a self,
        blob: &'a str,
        block_id: &'a str,
        data: Vec<u8>,
    ) -> BoxFuture<'a, Result<(), TransferError>> {
        Box::pin(async move {
            let client = self.container.blob_client(blob);
            client
                .put_block(BlockId::new(block_id.to_string()), Bytes::from(data))
                .await
                .map_err(storage_error)?;
            Ok(())
        })
    }

    fn commit_blocks<'a>(
        &'a self,
        blob: &'a str,
        block_ids: &'a [String],
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, TransferError>> {
        Box::pin(async move {
            let list = BlockList {
                blocks: block_ids
                    .iter()
                    .map(|id| BlobBlockType::Latest(BlockId::new(id.clone())))
                    .collect(),
            };
            let client = self.container.blob_client(blob);
            let response = client
                .put_block_list(list)
                .content_type(content_type.to_string())
                .await
                .map_err(storage_error)?;
            Ok(response.request_id.to_string())
        })
    }

    fn blob_url(&self, blob: &str) -> String {
        format!("{}/{}", self.container_url, encode_blob_name(blob))
    }
}

/// Maps SDK failures onto the error taxonomy: 401/403 are auth failures,
/// other service statuses are remote errors, the rest is transport.
pub(crate) fn storage_error(err: azure_core::Error) -> TransferError {
    let response = match err.kind() {
        ErrorKind::HttpResponse { status, error_code } => {
            Some((u16::from(*status), error_code.clone()))
        }
        _ => None,
    };
    match response {
        Some((status, code)) => {
            let detail = code.unwrap_or_else(|| err.to_string());
            if matches!(status, 401 | 403) {
                TransferError::Auth { status, detail }
            } else {
                TransferError::Remote { status, detail }
            }
        }
        None => TransferError::Http(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azure_core::StatusCode;

    fn store(cs: &str) -> AzureBlockStore {
        AzureBlockStore::new(StorageAccount::from_connection_string(cs).unwrap(), "test")
    }

    fn http_error(status: StatusCode, code: Option<&str>) -> azure_core::Error {
        azure_core::Error::new(
            ErrorKind::HttpResponse {
                status,
                error_code: code.map(str::to_string),
            },
            "request rejected",
        )
    }

    #[test]
    fn blob_names_are_percent_encoded() {
        assert_eq!(encode_blob_name("report.zip"), "report.zip");
        assert_eq!(encode_blob_name("q1/my report.zip"), "q1/my%20report.zip");
        assert_eq!(encode_blob_name("a+b#c"), "a%2Bb%23c");
    }

    #[test]
    fn blob_url_has_no_credentials() {
        let store = store(
            "BlobEndpoint=https://acct.blob.core.windows.net/;SharedAccessSignature=sv=2020&sig=abc",
        );
        assert_eq!(
            store.blob_url("q1/report.zip"),
            "https://acct.blob.core.windows.net/test/q1/report.zip"
        );
    }

    #[test]
    fn account_key_store_uses_account_endpoint() {
        let store = store("AccountName=acct;AccountKey=a2V5");
        assert_eq!(
            store.blob_url("report.zip"),
            "https://acct.blob.core.windows.net/test/report.zip"
        );
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("report.zip"), "application/zip");
        assert_eq!(content_type_for("REPORT.ZIP"), "application/zip");
        assert_eq!(content_type_for("backup.tar"), "application/x-tar");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn forbidden_maps_to_auth_error() {
        let err = storage_error(http_error(StatusCode::Forbidden, Some("AuthenticationFailed")));
        match err {
            TransferError::Auth { status, detail } => {
                assert_eq!(status, 403);
                assert_eq!(detail, "AuthenticationFailed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            storage_error(http_error(StatusCode::Unauthorized, None)),
            TransferError::Auth { status: 401, .. }
        ));
    }

    #[test]
    fn service_error_maps_to_remote_error() {
        let err = storage_error(http_error(StatusCode::InternalServerError, Some("InternalError")));
        assert!(matches!(
            err,
            TransferError::Remote { status: 500, ref detail } if detail == "InternalError"
        ));
    }

    #[test]
    fn transport_failure_maps_to_http_error() {
        let err = azure_core::Error::new(ErrorKind::Io, "connection refused");
        assert!(matches!(storage_error(err), TransferError::Http(_)));
    }
}
