//! Local filesystem storage backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::{BlobAppend, BlobStore, ByteStream};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use sysinfo::Disks;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem blob store.
///
/// Stores one file per key directly under the root directory. Keys are file
/// ids, which never contain path separators, but the store still validates
/// every key so a malformed caller cannot escape the root.
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Create a new filesystem store, creating the root directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Resolve the blob path for a key.
    ///
    /// Keys must be a single normal path component: no separators, no `..`,
    /// not absolute. Anything else would escape the storage root.
    fn blob_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }
        if key.contains('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(format!(
                "path separator not allowed: {key}"
            )));
        }
        let mut components = Path::new(key).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(StorageError::InvalidKey(format!(
                    "contains unsafe path component: {key}"
                )));
            }
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FilesystemStore {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn blob_len(&self, key: &str) -> StorageResult<Option<u64>> {
        let path = self.blob_path(key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn open_append(&self, key: &str) -> StorageResult<Box<dyn BlobAppend>> {
        let path = self.blob_path(key)?;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let start_offset = file.metadata().await?.len();

        Ok(Box::new(FilesystemAppend {
            file,
            path,
            start_offset,
            bytes_written: 0,
        }))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn read_stream(&self, key: &str) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let path = self.blob_path(key)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        // Stream the blob in chunks instead of loading it into memory
        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let path = self.blob_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn available_space(&self) -> StorageResult<u64> {
        // sysinfo enumerates mounts synchronously; keep it off the runtime.
        let root = self.root.canonicalize().map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize storage root: {e}"),
            ))
        })?;

        tokio::task::spawn_blocking(move || {
            let disks = Disks::new_with_refreshed_list();

            // The storage root belongs to the disk with the longest mount
            // point that prefixes it.
            let best = disks
                .list()
                .iter()
                .filter(|disk| root.starts_with(disk.mount_point()))
                .max_by_key(|disk| disk.mount_point().as_os_str().len());

            match best {
                Some(disk) => Ok(disk.available_space()),
                None => Err(StorageError::FreeSpace(format!(
                    "no mounted filesystem contains storage root {}",
                    root.display()
                ))),
            }
        })
        .await
        .map_err(|e| StorageError::FreeSpace(format!("spawn_blocking failed: {e}")))?
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("storage root not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("storage root is not a directory: {:?}", self.root),
            )));
        }

        Ok(())
    }
}

/// Append handle for the filesystem store.
struct FilesystemAppend {
    file: fs::File,
    path: PathBuf,
    start_offset: u64,
    bytes_written: u64,
}

#[async_trait]
impl BlobAppend for FilesystemAppend {
    fn offset(&self) -> u64 {
        self.start_offset
    }

    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        self.file.write_all(&data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> StorageResult<u64> {
        // Ensure appended data is on disk before the offset becomes visible
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(self.start_offset + self.bytes_written)
    }

    async fn discard(mut self: Box<Self>) -> StorageResult<()> {
        self.file.flush().await?;
        if self.start_offset == 0 {
            // Nothing was durable before this attempt; remove the blob
            drop(self.file);
            match fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::Io(e)),
            }
        } else {
            // Roll back to the bytes that were durable before this attempt
            self.file.set_len(self.start_offset).await?;
            self.file.sync_all().await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn read_all(store: &FilesystemStore, key: &str) -> Vec<u8> {
        let mut stream = store.read_stream(key).await.unwrap();
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn append_across_handles_resumes_at_durable_length() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path()).await.unwrap();

        let mut first = store.open_append("abc12").await.unwrap();
        assert_eq!(first.offset(), 0);
        first.write(Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(first.finish().await.unwrap(), 5);

        let mut second = store.open_append("abc12").await.unwrap();
        assert_eq!(second.offset(), 5);
        second.write(Bytes::from_static(b" world")).await.unwrap();
        assert_eq!(second.finish().await.unwrap(), 11);

        assert_eq!(store.blob_len("abc12").await.unwrap(), Some(11));
        assert_eq!(read_all(&store, "abc12").await, b"hello world");
    }

    #[tokio::test]
    async fn discard_rolls_back_to_open_offset() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path()).await.unwrap();

        let mut first = store.open_append("abc12").await.unwrap();
        first.write(Bytes::from_static(b"durable")).await.unwrap();
        first.finish().await.unwrap();

        let mut second = store.open_append("abc12").await.unwrap();
        second.write(Bytes::from_static(b"garbage")).await.unwrap();
        second.discard().await.unwrap();

        assert_eq!(store.blob_len("abc12").await.unwrap(), Some(7));
        assert_eq!(read_all(&store, "abc12").await, b"durable");
    }

    #[tokio::test]
    async fn discard_removes_blob_when_nothing_was_durable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path()).await.unwrap();

        let mut handle = store.open_append("abc12").await.unwrap();
        handle.write(Bytes::from_static(b"partial")).await.unwrap();
        handle.discard().await.unwrap();

        assert_eq!(store.blob_len("abc12").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path()).await.unwrap();

        let handle = store.open_append("abc12").await.unwrap();
        handle.finish().await.unwrap();

        assert!(store.delete("abc12").await.unwrap());
        assert!(!store.delete("abc12").await.unwrap());
        assert_eq!(store.blob_len("abc12").await.unwrap(), None);
    }

    #[tokio::test]
    async fn path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path()).await.unwrap();

        assert!(store.blob_len("../escape").await.is_err());
        assert!(store.blob_len("/absolute").await.is_err());
        assert!(store.blob_len("foo/bar").await.is_err());
        assert!(store.blob_len("..").await.is_err());
        assert!(store.blob_len("").await.is_err());

        assert!(store.blob_len("valid5").await.is_ok());
    }

    #[tokio::test]
    async fn read_stream_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path()).await.unwrap();

        match store.read_stream("abc12").await {
            Err(StorageError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn available_space_reports_nonzero() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path()).await.unwrap();

        let free = store.available_space().await.unwrap();
        assert!(free > 0);
    }
}
