use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use uuid::Uuid;

use crate::constants::{ERR_INVALID_FILE_NAME, WARN_UPLOAD_SIZE_BYTES};
use crate::db::files;
use crate::error::{AppError, Result};
use crate::models::file::{
    file_type_of, generate_storage_name, millis_to_rfc3339, sanitize_original_name,
};
use crate::models::{FileRecord, UploadedFile, User};
use crate::AppState;

/// Store an uploaded model for `owner`
///
/// 1. Validate the client-supplied name and its extension
/// 2. Generate a random storage name
/// 3. Stream bytes into the content area (atomic rename)
/// 4. Commit the metadata record and link it to the owner
///
/// Metadata is only written after the bytes are complete. If the metadata
/// commit fails, the stored bytes are removed again.
pub async fn upload<S>(
    state: &AppState,
    owner: &User,
    original_name: &str,
    content: S,
) -> Result<UploadedFile>
where
    S: Stream<Item = Result<Bytes>>,
{
    let original_name = sanitize_original_name(original_name)
        .ok_or_else(|| AppError::InvalidInput(ERR_INVALID_FILE_NAME.to_string()))?;

    let file_type = file_type_of(&original_name);
    if !state.config.accepts_extension(&file_type) {
        tracing::info!(
            "Rejected upload of type {:?} from user {}",
            file_type,
            owner.id
        );
        return Err(AppError::UnsupportedFileType(file_type));
    }

    let stored_name = generate_storage_name(&file_type);
    let size = state
        .content
        .write(&stored_name, content, state.config.max_upload_bytes)
        .await?;

    if size > WARN_UPLOAD_SIZE_BYTES {
        tracing::info!("Large upload from user {}: {} bytes", owner.id, size);
    }

    let file_id = Uuid::new_v4().to_string();
    let record = FileRecord {
        owner_id: owner.id.clone(),
        original_name,
        stored_name,
        file_type,
        size,
        uploaded_at: Utc::now().timestamp_millis(),
    };
    let response = UploadedFile {
        id: file_id.clone(),
        original_name: record.original_name.clone(),
        upload_date: millis_to_rfc3339(record.uploaded_at),
    };
    let stored_name = record.stored_name.clone();

    if let Err(err) = files::insert_file(&state.db, file_id.clone(), record).await {
        tracing::error!(
            "Metadata commit failed for {}, removing stored bytes: {}",
            stored_name,
            err
        );
        if let Err(cleanup_err) = state.content.remove(&stored_name).await {
            tracing::error!("Orphaned upload left at {}: {}", stored_name, cleanup_err);
        }
        return Err(err);
    }

    tracing::info!(
        "File {} stored for user {}: {} bytes",
        file_id,
        owner.id,
        size
    );

    Ok(response)
}
