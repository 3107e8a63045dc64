//! File lifecycle handlers: register, list, rename, upload, download, delete.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{parse_file_id, uploaded_size_for, validate_file_name, view_for};
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use depot_core::FileId;
use depot_core::file::{CreateFileRequest, DeleteFileResponse, FileView, RenameFileRequest};
use depot_metadata::MetadataError;
use depot_metadata::models::FileRow;
use futures::StreamExt;
use time::OffsetDateTime;

/// Attempts at drawing a fresh id when registration hits a key collision.
const MAX_ID_ATTEMPTS: u32 = 3;

/// GET /files - List all file records.
pub async fn list_files(State(state): State<AppState>) -> ApiResult<Json<Vec<FileView>>> {
    let rows = state.metadata.list_files().await?;

    let mut views = Vec::with_capacity(rows.len());
    for row in &rows {
        let uploaded_size = uploaded_size_for(&state, row).await?;
        views.push(view_for(row, uploaded_size)?);
    }

    Ok(Json(views))
}

/// POST /files - Register a file by name and declared size.
///
/// Runs the admission check before any record exists; nothing is reserved
/// and no blob is created until the first upload call.
pub async fn register_file(
    State(state): State<AppState>,
    Json(body): Json<CreateFileRequest>,
) -> ApiResult<(StatusCode, Json<FileView>)> {
    validate_file_name(&body.name)?;
    state.admission.admit(body.size).await?;

    let now = OffsetDateTime::now_utc();
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let id = FileId::generate();
        let row = FileRow {
            file_id: id.as_str().to_string(),
            file_name: body.name.clone(),
            // admission capped the size at the configured ceiling, which
            // config validation keeps within i64
            size_bytes: body.size as i64,
            uploaded_at: None,
            created_at: now,
            updated_at: now,
        };

        match state.metadata.create_file(&row).await {
            Ok(()) => {
                tracing::info!(file_id = %id, size = body.size, "file registered");
                return Ok((StatusCode::CREATED, Json(view_for(&row, 0)?)));
            }
            Err(MetadataError::AlreadyExists(_)) => {
                tracing::warn!(file_id = %id, attempt, "file id collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::Internal(format!(
        "could not allocate a unique file id after {MAX_ID_ATTEMPTS} attempts"
    )))
}

/// PATCH /files/{file_id} - Update the display name.
pub async fn rename_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Json(body): Json<RenameFileRequest>,
) -> ApiResult<Json<FileView>> {
    let id = parse_file_id(&file_id)?;
    validate_file_name(&body.name)?;

    state
        .metadata
        .rename_file(id.as_str(), &body.name, OffsetDateTime::now_utc())
        .await?;

    let row = state
        .metadata
        .get_file(id.as_str())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("file {id} not found")))?;
    let uploaded_size = uploaded_size_for(&state, &row).await?;
    Ok(Json(view_for(&row, uploaded_size)?))
}

/// PATCH /files/upload/{file_id} - Append a chunk of the file body.
///
/// The raw request body is handed to the upload engine, which resumes at
/// the blob's current durable offset. Clients repeat the call until the
/// declared size has landed.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    body: Body,
) -> ApiResult<Json<FileView>> {
    let id = parse_file_id(&file_id)?;
    let view = state.engine.upload(&id, body.into_data_stream()).await?;
    Ok(Json(view))
}

/// GET /files/download/{file_id} - Stream a completed file.
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_file_id(&file_id)?;

    let row = state
        .metadata
        .get_file(id.as_str())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("file {id} not found")))?;

    if !row.is_uploaded() {
        return Err(ApiError::BadRequest(format!(
            "file {id} is not uploaded yet"
        )));
    }

    let stream = state.storage.read_stream(id.as_str()).await?;
    let body_stream = stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/octet-stream".to_string()),
            (CONTENT_LENGTH, row.size_bytes.to_string()),
            (CONTENT_DISPOSITION, content_disposition(&row.file_name)),
        ],
        Body::from_stream(body_stream),
    )
        .into_response())
}

/// DELETE /files/{file_id} - Remove the blob and the record.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<Json<DeleteFileResponse>> {
    let id = parse_file_id(&file_id)?;

    // Hold the upload lock so deletion never races an in-flight append.
    let locks = state.engine.locks();
    let guard = locks.acquire(id.as_str()).await;

    state
        .metadata
        .get_file(id.as_str())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("file {id} not found")))?;

    // Blob before record: a crash in between leaves an orphaned record that
    // a retried delete can clean up, never an unowned blob.
    let removed = state.storage.delete(id.as_str()).await?;
    if !removed {
        tracing::debug!(file_id = %id, "blob already absent during delete");
    }

    state.metadata.delete_file(id.as_str()).await?;

    drop(guard);
    locks.remove(id.as_str()).await;

    tracing::info!(file_id = %id, "file deleted");
    Ok(Json(DeleteFileResponse { deleted: true }))
}

/// Build an attachment disposition, keeping the filename header-safe.
fn content_disposition(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c == '"' || c == '\\' || !c.is_ascii() || c.is_ascii_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_escapes_unsafe_characters() {
        assert_eq!(
            content_disposition("a.txt"),
            "attachment; filename=\"a.txt\""
        );
        assert_eq!(
            content_disposition("we\"ird\\name\n"),
            "attachment; filename=\"we_ird_name_\""
        );
        assert_eq!(
            content_disposition("ünïcode.bin"),
            "attachment; filename=\"_n_code.bin\""
        );
    }
}
