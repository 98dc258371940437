use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::ArchiveError;
use crate::scanner::ArchiveEntry;

/// Writes `entries` into a deflate-compressed zip at `archive_path`.
pub fn write_zip(archive_path: &Path, entries: &[ArchiveEntry]) -> Result<(), ArchiveError> {
    let file = File::create(archive_path)?;
    let mut writer = zip::ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);

    for entry in entries {
        match entry {
            ArchiveEntry::File { source, name } => {
                let mut input = File::open(source)?;
                writer.start_file(name.as_str(), options)?;
                io::copy(&mut input, &mut writer)?;
            }
            ArchiveEntry::Directory { name } => {
                writer.add_directory(name.as_str(), options)?;
            }
        }
    }

    let mut out = writer.finish()?;
    io::Write::flush(&mut out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_readable_archive() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("data.txt");
        std::fs::write(&src, b"hello zip").unwrap();
        let out = dir.path().join("out.zip");

        let entries = vec![
            ArchiveEntry::File {
                source: src,
                name: "nested/data.txt".into(),
            },
            ArchiveEntry::Directory {
                name: "blank".into(),
            },
        ];
        write_zip(&out, &entries).unwrap();

        let archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn missing_source_file_fails() {
        let dir = TempDir::new().unwrap();
        let entries = vec![ArchiveEntry::File {
            source: dir.path().join("gone.txt"),
            name: "gone.txt".into(),
        }];
        let err = write_zip(&dir.path().join("out.zip"), &entries).unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }
}
