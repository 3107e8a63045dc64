//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Blob store keyed by file id.
///
/// One blob per key, written append-only by [`BlobAppend`] handles. The
/// on-disk blob length is the source of truth for upload progress, so the
/// store never tracks offsets itself.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Get the durable length of a blob in bytes.
    ///
    /// Returns `None` when no blob exists for the key yet.
    async fn blob_len(&self, key: &str) -> StorageResult<Option<u64>>;

    /// Open a blob for appending, creating it if missing.
    ///
    /// The returned handle is positioned at the current durable length.
    async fn open_append(&self, key: &str) -> StorageResult<Box<dyn BlobAppend>>;

    /// Stream the blob contents from the beginning.
    async fn read_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Delete a blob.
    ///
    /// Returns `false` when the blob was already absent; an already-missing
    /// blob is not an error, since the net state is identical.
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Query the free space currently available to the store, in bytes.
    async fn available_space(&self) -> StorageResult<u64>;

    /// Check that the backing store is reachable and writable.
    async fn health_check(&self) -> StorageResult<()>;
}

/// An in-progress append to a single blob.
///
/// Exactly one of [`finish`](BlobAppend::finish) or
/// [`discard`](BlobAppend::discard) must be called. `finish` makes the
/// appended bytes durable; `discard` rolls the blob back to the length it
/// had when the handle was opened, so a failed attempt never moves the
/// durable offset.
#[async_trait]
pub trait BlobAppend: Send {
    /// The durable offset at the time this handle was opened.
    fn offset(&self) -> u64;

    /// Append a chunk.
    async fn write(&mut self, data: Bytes) -> StorageResult<()>;

    /// Flush to disk and return the final blob length.
    async fn finish(self: Box<Self>) -> StorageResult<u64>;

    /// Roll the blob back to [`offset`](BlobAppend::offset).
    ///
    /// If nothing was durable before this attempt, the blob is removed
    /// entirely.
    async fn discard(self: Box<Self>) -> StorageResult<()>;
}
