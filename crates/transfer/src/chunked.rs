use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Largest number of blocks a single blob may be committed from.
pub(crate) const MAX_BLOCKS: usize = 50_000;

/// Returns the block id for the block at `index`.
///
/// Ids must have the same length for every block of a blob, so the index is
/// zero-padded. The SDK base64-encodes it on the wire.
pub fn block_id(index: usize) -> String {
    format!("block-{index:06}")
}

/// One block of file data ready to be staged.
#[derive(Debug, Clone)]
pub struct Block {
    /// Position of the block in the committed list.
    pub index: usize,
    /// Fixed-width block id.
    pub id: String,
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw block data.
    pub data: Vec<u8>,
}

/// Reads a file in fixed-size blocks.
pub struct BlockReader {
    file: tokio::fs::File,
    chunk_size: usize,
    offset: u64,
    index: usize,
    file_size: u64,
}

impl BlockReader {
    /// Opens `path` for block reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (4 MiB) is used. Fails
    /// with [`TransferError::Config`] when the file would need more blocks
    /// than a blob can hold.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = tokio::fs::File::open(path).await?;
        let file_size = file.metadata().await?.len();
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        let reader = Self {
            file,
            chunk_size,
            offset: 0,
            index: 0,
            file_size,
        };
        if reader.block_count() > MAX_BLOCKS {
            return Err(TransferError::Config(format!(
                "{} needs {} blocks of {chunk_size} bytes, the limit is {MAX_BLOCKS}",
                path.display(),
                reader.block_count()
            )));
        }
        Ok(reader)
    }

    /// Reads the next block. Returns `None` at EOF.
    pub async fn next_block(&mut self) -> Result<Option<Block>, TransferError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }

        let read_size = remaining.min(self.chunk_size as u64) as usize;
        let mut data = vec![0u8; read_size];
        self.file.read_exact(&mut data).await?;

        let block = Block {
            index: self.index,
            id: block_id(self.index),
            offset: self.offset,
            data,
        };
        self.offset += read_size as u64;
        self.index += 1;
        Ok(Some(block))
    }

    /// Number of blocks the whole file splits into.
    pub fn block_count(&self) -> usize {
        self.file_size.div_ceil(self.chunk_size as u64) as usize
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> u64 {
        self.file_size - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[test]
    fn block_ids_have_equal_length() {
        let first = block_id(0);
        let last = block_id(MAX_BLOCKS - 1);
        assert_eq!(first.len(), last.len());
        assert_ne!(first, block_id(1));
        assert_eq!(first, "block-000000");
    }

    #[tokio::test]
    async fn reader_reads_all_blocks() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"AABBCCDDEE");

        let mut reader = BlockReader::open(&path, 4).await.unwrap();
        assert_eq!(reader.file_size(), 10);
        assert_eq!(reader.block_count(), 3);

        let b1 = reader.next_block().await.unwrap().unwrap();
        assert_eq!(b1.index, 0);
        assert_eq!(b1.offset, 0);
        assert_eq!(&b1.data, b"AABB");
        assert_eq!(b1.id, block_id(0));
        assert_eq!(reader.remaining(), 6);

        let b2 = reader.next_block().await.unwrap().unwrap();
        assert_eq!(b2.offset, 4);
        assert_eq!(&b2.data, b"CCDD");

        let b3 = reader.next_block().await.unwrap().unwrap();
        assert_eq!(b3.index, 2);
        assert_eq!(b3.offset, 8);
        assert_eq!(&b3.data, b"EE");

        assert!(reader.next_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_file_has_no_blocks() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "empty.bin", b"");
        let mut reader = BlockReader::open(&path, 4).await.unwrap();
        assert_eq!(reader.block_count(), 0);
        assert!(reader.next_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_chunk_size_uses_default() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"x");
        let reader = BlockReader::open(&path, 0).await.unwrap();
        assert_eq!(reader.block_count(), 1);
    }

    #[tokio::test]
    async fn too_many_blocks_rejected() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "big.bin", &vec![0u8; MAX_BLOCKS + 1]);
        let result = BlockReader::open(&path, 1).await;
        assert!(matches!(result, Err(TransferError::Config(_))));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = BlockReader::open(&dir.path().join("nope.bin"), 4).await;
        assert!(matches!(result, Err(TransferError::Io(_))));
    }
}
