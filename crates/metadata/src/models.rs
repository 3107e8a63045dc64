//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;

/// File record.
///
/// `uploaded_at` doubles as the completion flag: NULL means the upload is
/// still pending and the blob may be shorter than `size_bytes`. There is
/// deliberately no byte-offset column; the on-disk blob length is the
/// authoritative progress counter.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub file_id: String,
    pub file_name: String,
    /// Declared size in bytes, fixed at registration.
    pub size_bytes: i64,
    /// Completion timestamp; NULL while the upload is pending.
    pub uploaded_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl FileRow {
    /// Whether the record has reached its terminal, complete state.
    pub fn is_uploaded(&self) -> bool {
        self.uploaded_at.is_some()
    }
}
