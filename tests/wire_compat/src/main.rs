fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::PathBuf;

    use blobdrop_protocol::{Configuration, Request, Response, WebhookPayload};

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes `value`, re-serializes it and checks nothing changed.
    fn roundtrip<T>(label: &str, value: &serde_json::Value) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let parsed: T = serde_json::from_value(value.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {label}: {e}\n  {value}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {label}: {e}"));
        assert_eq!(
            value, &reserialized,
            "roundtrip mismatch for {label}:\n  fixture: {value}\n  rust:    {reserialized}"
        );
        parsed
    }

    fn roundtrip_all<T>(name: &str) -> Vec<T>
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let items = fixture
            .as_array()
            .unwrap_or_else(|| panic!("{name} must hold an array"));
        items
            .iter()
            .enumerate()
            .map(|(i, item)| roundtrip(&format!("{name}[{i}]"), item))
            .collect()
    }

    fn tags(name: &str) -> BTreeSet<String> {
        load_fixture(name)
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["type"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn requests_roundtrip() {
        let requests: Vec<Request> = roundtrip_all("requests.json");
        assert_eq!(
            requests[5],
            Request::Upload {
                path: "/home/user/report.zip".into(),
                destination_name: Some("2024/q1/report.zip".into()),
            }
        );
    }

    #[test]
    fn every_request_type_has_a_fixture() {
        let expected: BTreeSet<String> = [
            "get-config",
            "select-folder",
            "select-file",
            "update-config",
            "upload",
            "abort",
            "check-for-updates",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(tags("requests.json"), expected);
    }

    #[test]
    fn responses_roundtrip() {
        let responses: Vec<Response> = roundtrip_all("responses.json");
        assert_eq!(responses[2], Response::FolderSelected { path: None });
        assert!(responses[7].is_upload_terminal());
        assert!(!responses[6].is_upload_terminal());
    }

    #[test]
    fn every_response_type_has_a_fixture() {
        let expected: BTreeSet<String> = [
            "initial-config",
            "folder-selected",
            "file-selected",
            "folder-compressed",
            "config-updated",
            "upload-progress",
            "upload-finished",
            "upload-failed",
            "upload-aborted",
            "check-for-updates-result",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(tags("responses.json"), expected);
    }

    #[test]
    fn persisted_config_roundtrip() {
        let config: Configuration = roundtrip("config.json", &load_fixture("config.json"));
        assert_eq!(config.container_name, "test");
    }

    #[test]
    fn webhook_payload_roundtrip() {
        let payload: WebhookPayload =
            roundtrip("webhook_payload.json", &load_fixture("webhook_payload.json"));
        assert_eq!(
            payload.blob_url,
            "https://acct.blob.core.windows.net/test/report.zip"
        );
    }

    #[test]
    fn unknown_request_type_is_rejected() {
        let value = serde_json::json!({"type": "format-disk"});
        assert!(serde_json::from_value::<Request>(value).is_err());
    }
}
