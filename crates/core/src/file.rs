//! File request payloads and the externally visible file view.

use crate::FileId;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Request body for registering a new file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateFileRequest {
    /// Client-supplied display name. Never used as a storage key.
    pub name: String,
    /// Declared size in bytes. Fixed for the lifetime of the record.
    pub size: u64,
}

/// Request body for renaming a file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RenameFileRequest {
    /// New display name.
    pub name: String,
}

/// Externally visible view of a file record.
///
/// `uploaded_size` reports the bytes durably on disk, which trails the
/// declared `size` until the upload completes.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub id: FileId,
    pub name: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Bytes durably received so far.
    pub uploaded_size: u64,
    /// Completion timestamp; absent while the upload is still pending.
    #[serde(
        with = "time::serde::rfc3339::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub uploaded_at: Option<OffsetDateTime>,
}

/// Acknowledgment returned by the delete operation.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeleteFileResponse {
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_view_omits_uploaded_at_while_pending() {
        let view = FileView {
            id: FileId::parse("11111").unwrap(),
            name: "a.txt".to_string(),
            size: 10,
            uploaded_size: 5,
            uploaded_at: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["uploadedSize"], 5);
        assert!(json.get("uploadedAt").is_none());
    }

    #[test]
    fn file_view_serializes_completion_timestamp() {
        let view = FileView {
            id: FileId::parse("11111").unwrap(),
            name: "a.txt".to_string(),
            size: 10,
            uploaded_size: 10,
            uploaded_at: Some(OffsetDateTime::UNIX_EPOCH),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["uploadedAt"], "1970-01-01T00:00:00Z");
    }
}
