//! The resumable upload engine.
//!
//! Consumes an inbound byte stream for a registered file, appends it to the
//! blob starting at the current durable offset, enforces the declared-size
//! contract, and flips the record to complete exactly once when the full
//! declared size has landed.
//!
//! The durable offset is always derived from the on-disk blob length, never
//! from persisted counters, so a partially written file resumes correctly
//! after process restarts by construction.

use crate::error::{ApiError, ApiResult};
use crate::locks::UploadLocks;
use bytes::Bytes;
use depot_core::{FileId, FileView};
use depot_metadata::MetadataStore;
use depot_storage::{BlobAppend, BlobStore};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use time::OffsetDateTime;

/// Engine owning the append path for all blobs.
pub struct UploadEngine {
    metadata: Arc<dyn MetadataStore>,
    storage: Arc<dyn BlobStore>,
    locks: UploadLocks,
}

impl UploadEngine {
    /// Create a new upload engine.
    pub fn new(metadata: Arc<dyn MetadataStore>, storage: Arc<dyn BlobStore>) -> Self {
        Self {
            metadata,
            storage,
            locks: UploadLocks::new(),
        }
    }

    /// The per-file lock table shared with the deletion path.
    pub fn locks(&self) -> &UploadLocks {
        &self.locks
    }

    /// Append an inbound byte stream to the blob for `file_id`.
    ///
    /// Returns the updated view on success. A failed attempt (overflow,
    /// transport error, write error) rolls the blob back to the offset it
    /// had when the attempt started, so previously durable bytes survive
    /// and the client can resume from them.
    pub async fn upload<S, E>(&self, file_id: &FileId, body: S) -> ApiResult<FileView>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::fmt::Display,
    {
        // At most one append in flight per id; concurrent appenders would
        // interleave writes and corrupt the blob.
        let _guard = self.locks.acquire(file_id.as_str()).await;

        let record = self
            .metadata
            .get_file(file_id.as_str())
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("file {file_id} not found")))?;

        if record.is_uploaded() {
            // Terminal state; the body is intentionally left unconsumed.
            return Err(ApiError::Conflict(format!(
                "file {file_id} is already uploaded"
            )));
        }

        let declared = record.size_bytes as u64;

        let mut blob = self.storage.open_append(file_id.as_str()).await?;
        let offset = blob.offset();
        if offset > declared {
            // Only external interference with the blob can get us here.
            discard_attempt(blob, file_id).await;
            return Err(ApiError::Internal(format!(
                "blob for {file_id} is {offset} bytes, longer than the declared {declared}"
            )));
        }

        let mut received = offset;
        futures::pin_mut!(body);
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(chunk) => {
                    let next_total = received + chunk.len() as u64;
                    if next_total > declared {
                        // Abort before writing anything past the contract.
                        discard_attempt(blob, file_id).await;
                        tracing::warn!(
                            file_id = %file_id,
                            declared,
                            attempted = next_total,
                            "upload overflowed declared size"
                        );
                        return Err(ApiError::StreamOverflow { declared });
                    }
                    if let Err(e) = blob.write(chunk).await {
                        discard_attempt(blob, file_id).await;
                        return Err(e.into());
                    }
                    received = next_total;
                }
                Err(e) => {
                    // Peer disconnects and mid-stream transport faults land
                    // here; nothing from this attempt is kept.
                    discard_attempt(blob, file_id).await;
                    tracing::warn!(file_id = %file_id, error = %e, "upload stream failed");
                    return Err(ApiError::TransportFailure(e.to_string()));
                }
            }
        }

        let durable = blob.finish().await?;
        if durable != received {
            return Err(ApiError::Internal(format!(
                "blob length {durable} does not match received total {received}"
            )));
        }

        let mut uploaded_at = None;
        if received == declared {
            let now = OffsetDateTime::now_utc();
            self.metadata.mark_uploaded(file_id.as_str(), now).await?;
            uploaded_at = Some(now);
            tracing::info!(file_id = %file_id, size = declared, "upload complete");
        } else {
            tracing::debug!(
                file_id = %file_id,
                received,
                declared,
                "partial upload stored, awaiting resume"
            );
        }

        Ok(FileView {
            id: file_id.clone(),
            name: record.file_name,
            size: declared,
            uploaded_size: received,
            uploaded_at,
        })
    }
}

/// Roll a failed attempt back to its starting offset, logging on failure.
async fn discard_attempt(blob: Box<dyn BlobAppend>, file_id: &FileId) {
    if let Err(e) = blob.discard().await {
        tracing::warn!(
            file_id = %file_id,
            error = %e,
            "failed to roll back partial upload attempt"
        );
    }
}
