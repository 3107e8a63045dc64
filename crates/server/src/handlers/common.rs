//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use depot_core::{FileId, FileView, MAX_FILE_NAME_LEN};
use depot_metadata::models::FileRow;

/// Parse a path-supplied file id.
pub(crate) fn parse_file_id(raw: &str) -> ApiResult<FileId> {
    FileId::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Validate a client-supplied display name.
pub(crate) fn validate_file_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("file name cannot be empty".to_string()));
    }
    if name.len() > MAX_FILE_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "file name exceeds {MAX_FILE_NAME_LEN} bytes"
        )));
    }
    Ok(())
}

/// Build the external view of a record.
pub(crate) fn view_for(row: &FileRow, uploaded_size: u64) -> ApiResult<FileView> {
    let id = FileId::parse(&row.file_id)
        .map_err(|e| ApiError::Internal(format!("corrupt file id in metadata: {e}")))?;
    Ok(FileView {
        id,
        name: row.file_name.clone(),
        size: row.size_bytes as u64,
        uploaded_size,
        uploaded_at: row.uploaded_at,
    })
}

/// Bytes durably on disk for a record.
///
/// Complete records report their declared size without touching storage;
/// pending records stat the blob, absent blob meaning zero.
pub(crate) async fn uploaded_size_for(state: &AppState, row: &FileRow) -> ApiResult<u64> {
    if row.is_uploaded() {
        return Ok(row.size_bytes as u64);
    }
    Ok(state.storage.blob_len(&row.file_id).await?.unwrap_or(0))
}
