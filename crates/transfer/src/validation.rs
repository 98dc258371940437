use crate::TransferError;

/// Maximum blob name length accepted by the service.
const MAX_BLOB_NAME_LEN: usize = 1024;

/// Validates a destination blob name.
///
/// Rejects:
/// - Empty names and names over 1024 characters
/// - Backslashes (callers pass bare file names, not Windows paths)
/// - Empty, `.` or `..` path segments
pub fn validate_blob_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidBlobName("empty name".into()));
    }

    if name.chars().count() > MAX_BLOB_NAME_LEN {
        return Err(TransferError::InvalidBlobName(format!(
            "longer than {MAX_BLOB_NAME_LEN} characters"
        )));
    }

    if name.contains('\\') {
        return Err(TransferError::InvalidBlobName(format!(
            "backslash not allowed: {name}"
        )));
    }

    for segment in name.split('/') {
        match segment {
            "" => {
                return Err(TransferError::InvalidBlobName(format!(
                    "empty path segment: {name}"
                )));
            }
            "." | ".." => {
                return Err(TransferError::InvalidBlobName(format!(
                    "relative segment not allowed: {name}"
                )));
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(validate_blob_name("").is_err());
    }

    #[test]
    fn rejects_parent_dir_segment() {
        assert!(validate_blob_name("../report.zip").is_err());
        assert!(validate_blob_name("a/../b.zip").is_err());
    }

    #[test]
    fn rejects_current_dir_segment() {
        assert!(validate_blob_name("./report.zip").is_err());
    }

    #[test]
    fn rejects_leading_and_double_slashes() {
        assert!(validate_blob_name("/report.zip").is_err());
        assert!(validate_blob_name("a//b.zip").is_err());
        assert!(validate_blob_name("dir/").is_err());
    }

    #[test]
    fn rejects_backslash() {
        assert!(validate_blob_name("C:\\Users\\report.zip").is_err());
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "a".repeat(1025);
        assert!(validate_blob_name(&name).is_err());
        assert!(validate_blob_name(&"a".repeat(1024)).is_ok());
    }

    #[test]
    fn accepts_plain_and_nested_names() {
        assert!(validate_blob_name("report.zip").is_ok());
        assert!(validate_blob_name("2024/q1/report.zip").is_ok());
        assert!(validate_blob_name(".hidden").is_ok());
        assert!(validate_blob_name("résumé final.pdf").is_ok());
    }
}
