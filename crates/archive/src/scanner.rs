//! Directory scanning for archiving.
//!
//! Recursively walks a directory and produces archive entries with
//! relative paths normalized to forward slashes.

use std::path::{Path, PathBuf};

/// One item to place in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveEntry {
    /// A regular file, read from `source` and stored as `name`.
    File { source: PathBuf, name: String },
    /// An empty directory, stored as `name/`.
    Directory { name: String },
}

impl ArchiveEntry {
    /// Entry name inside the archive.
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Directory { name } => name,
        }
    }
}

/// Scans `root` recursively and returns its entries in a stable order.
///
/// Entry names use `/` as separator (even on Windows). Only empty
/// directories get their own entry; non-empty ones are implied by the
/// files below them. Symbolic links are skipped, so a link back to an
/// ancestor cannot loop the walk.
pub fn scan_directory(root: &Path) -> std::io::Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();
    walk_dir(root, root, &mut entries)?;
    Ok(entries)
}

fn walk_dir(root: &Path, current: &Path, entries: &mut Vec<ArchiveEntry>) -> std::io::Result<()> {
    let mut children: Vec<_> = std::fs::read_dir(current)?.collect::<Result<_, _>>()?;
    children.sort_by_key(|e| e.file_name());

    if children.is_empty() && current != root {
        entries.push(ArchiveEntry::Directory {
            name: relative_name(root, current)?,
        });
        return Ok(());
    }

    for entry in children {
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            tracing::debug!(path = %path.display(), "skipping symbolic link");
        } else if file_type.is_dir() {
            walk_dir(root, &path, entries)?;
        } else if file_type.is_file() {
            entries.push(ArchiveEntry::File {
                name: relative_name(root, &path)?,
                source: path,
            });
        }
    }

    Ok(())
}

fn relative_name(root: &Path, path: &Path) -> std::io::Result<String> {
    let rel = path.strip_prefix(root).map_err(std::io::Error::other)?;
    Ok(rel.to_string_lossy().replace('\\', "/"))
}
