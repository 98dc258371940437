use semver::Version;

fn parse(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// Whether `remote` is a newer release than `current`.
///
/// Uses semantic-version ordering; a leading `v` is ignored. If either side
/// is not a valid version the strings are compared lexically.
pub fn is_newer(remote: &str, current: &str) -> bool {
    match (parse(remote), parse(current)) {
        (Some(remote), Some(current)) => remote > current,
        _ => remote.trim() > current.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semver_ordering() {
        assert!(is_newer("1.2.0", "1.1.9"));
        assert!(is_newer("1.10.0", "1.9.0"));
        assert!(!is_newer("1.2.0", "1.2.0"));
        assert!(!is_newer("1.0.0", "1.2.0"));
    }

    #[test]
    fn leading_v_ignored() {
        assert!(is_newer("v2.0.0", "1.9.9"));
        assert!(!is_newer("v1.0.0", "1.0.0"));
    }

    #[test]
    fn prerelease_is_older_than_release() {
        assert!(is_newer("1.0.0", "1.0.0-beta.1"));
        assert!(!is_newer("1.0.0-beta.2", "1.0.0"));
    }

    #[test]
    fn invalid_versions_compare_lexically() {
        assert!(is_newer("2024-06", "2024-05"));
        assert!(!is_newer("build-1", "build-2"));
    }
}
