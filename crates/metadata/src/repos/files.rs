//! File record repository.

use crate::error::MetadataResult;
use crate::models::FileRow;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for file record operations.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Create a new file record.
    ///
    /// Fails with `AlreadyExists` when the id collides with an existing
    /// record; the caller decides whether to retry with a fresh id.
    async fn create_file(&self, file: &FileRow) -> MetadataResult<()>;

    /// Get a file record by id.
    async fn get_file(&self, file_id: &str) -> MetadataResult<Option<FileRow>>;

    /// List all file records, oldest first.
    async fn list_files(&self) -> MetadataResult<Vec<FileRow>>;

    /// Update the display name of a file.
    ///
    /// Fails with `NotFound` when no record exists for the id.
    async fn rename_file(
        &self,
        file_id: &str,
        file_name: &str,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<()>;

    /// Mark a file as fully uploaded.
    ///
    /// The transition happens at most once: a record whose `uploaded_at` is
    /// already set fails with `AlreadyExists`, a missing record with
    /// `NotFound`.
    async fn mark_uploaded(
        &self,
        file_id: &str,
        uploaded_at: OffsetDateTime,
    ) -> MetadataResult<()>;

    /// Delete a file record.
    ///
    /// Fails with `NotFound` when no record exists for the id.
    async fn delete_file(&self, file_id: &str) -> MetadataResult<()>;
}
