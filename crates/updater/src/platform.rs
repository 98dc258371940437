use std::fmt;

/// Operating system family a release is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this binary was built for. Unknown targets use the
    /// Windows manifest, which has no suffix.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Windows
        }
    }

    /// Suffix between `latest` and `.yml` in the manifest file name.
    pub fn manifest_suffix(self) -> &'static str {
        match self {
            Self::Windows => "",
            Self::MacOs => "-mac",
            Self::Linux => "-linux",
        }
    }

    /// Manifest file name, e.g. `latest-mac.yml`.
    pub fn manifest_name(self) -> String {
        format!("latest{}.yml", self.manifest_suffix())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_names() {
        assert_eq!(Platform::Windows.manifest_name(), "latest.yml");
        assert_eq!(Platform::MacOs.manifest_name(), "latest-mac.yml");
        assert_eq!(Platform::Linux.manifest_name(), "latest-linux.yml");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn current_on_linux() {
        assert_eq!(Platform::current(), Platform::Linux);
    }
}
