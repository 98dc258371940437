//! Folder archiving ahead of upload.
//!
//! A selected directory is compressed into `<name>.zip` in its parent
//! directory. The archive is written to a `.partial` file first and renamed
//! into place, so a failed run never leaves a truncated archive behind.

mod scanner;
mod writer;

use std::path::{Path, PathBuf};

pub use scanner::{ArchiveEntry, scan_directory};
pub use writer::write_zip;

/// Errors produced while archiving a folder.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("cannot derive an archive name from {0}")]
    InvalidSource(String),
}

/// Returns where the archive for `source` is written: `<parent>/<name>.zip`.
pub fn archive_path_for(source: &Path) -> Result<PathBuf, ArchiveError> {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ArchiveError::InvalidSource(source.display().to_string()))?;
    let parent = source.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!("{name}.zip")))
}

/// Compresses `source` into a single zip archive placed alongside it.
///
/// Runs the filesystem work on the blocking pool. Returns the archive path.
pub async fn archive_directory(source: &Path) -> Result<PathBuf, ArchiveError> {
    let source = source.to_path_buf();
    tokio::task::spawn_blocking(move || archive_directory_blocking(&source))
        .await
        .map_err(|e| ArchiveError::Io(std::io::Error::other(e)))?
}

/// Synchronous variant of [`archive_directory`].
pub fn archive_directory_blocking(source: &Path) -> Result<PathBuf, ArchiveError> {
    let metadata = std::fs::metadata(source)?;
    if !metadata.is_dir() {
        return Err(ArchiveError::NotADirectory(source.display().to_string()));
    }

    let target = archive_path_for(source)?;
    let partial = target.with_extension("zip.partial");

    let entries = scan_directory(source)?;
    tracing::debug!(
        source = %source.display(),
        entries = entries.len(),
        "archiving folder"
    );

    if let Err(e) = write_zip(&partial, &entries) {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }
    std::fs::rename(&partial, &target)?;

    tracing::info!(archive = %target.display(), "folder compressed");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn sample_tree(root: &Path) -> PathBuf {
        let src = root.join("photos");
        fs::create_dir_all(src.join("2024/summer")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("index.txt"), b"index").unwrap();
        fs::write(src.join("2024/summer/beach.jpg"), b"JPEGDATA").unwrap();
        src
    }

    #[test]
    fn archive_path_is_sibling_zip() {
        let path = archive_path_for(Path::new("/home/user/photos")).unwrap();
        assert_eq!(path, PathBuf::from("/home/user/photos.zip"));
    }

    #[test]
    fn archive_path_rejects_root() {
        assert!(matches!(
            archive_path_for(Path::new("/")),
            Err(ArchiveError::InvalidSource(_))
        ));
    }

    #[tokio::test]
    async fn produces_single_zip_in_parent() {
        let dir = TempDir::new().unwrap();
        let src = sample_tree(dir.path());

        let archive = archive_directory(&src).await.unwrap();
        assert_eq!(archive, dir.path().join("photos.zip"));
        assert!(archive.is_file());

        let zips: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".zip"))
            .collect();
        assert_eq!(zips.len(), 1);
        assert!(!dir.path().join("photos.zip.partial").exists());
    }

    #[tokio::test]
    async fn archive_contains_relative_entries() {
        let dir = TempDir::new().unwrap();
        let src = sample_tree(dir.path());
        let archive = archive_directory(&src).await.unwrap();

        let file = fs::File::open(&archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let names: Vec<String> = zip.file_names().map(String::from).collect();
        assert!(names.contains(&"index.txt".to_string()));
        assert!(names.contains(&"2024/summer/beach.jpg".to_string()));
        assert!(names.contains(&"empty/".to_string()));

        let mut content = String::new();
        zip.by_name("index.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "index");
    }

    #[tokio::test]
    async fn replaces_existing_archive() {
        let dir = TempDir::new().unwrap();
        let src = sample_tree(dir.path());
        fs::write(dir.path().join("photos.zip"), b"stale").unwrap();

        let archive = archive_directory(&src).await.unwrap();
        let file = fs::File::open(&archive).unwrap();
        assert!(zip::ZipArchive::new(file).is_ok());
    }

    #[tokio::test]
    async fn file_source_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("report.zip");
        fs::write(&file, b"x").unwrap();

        let err = archive_directory(&file).await.unwrap_err();
        assert!(matches!(err, ArchiveError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = archive_directory(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }
}
