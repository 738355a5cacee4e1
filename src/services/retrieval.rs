use tokio::fs::File;

use crate::db::files;
use crate::error::{AppError, Result};
use crate::models::{FileSummary, User};
use crate::AppState;

/// An owned file ready to be streamed back to its owner
#[derive(Debug)]
pub struct Download {
    pub original_name: String,
    pub file_type: String,
    pub size: u64,
    pub file: File,
}

/// List the owner's files, most recent first
///
/// A user without uploads gets an empty list.
pub async fn list_files(state: &AppState, owner: &User) -> Result<Vec<FileSummary>> {
    let records = files::list_for_owner(&state.db, owner.id.clone()).await?;

    Ok(records
        .iter()
        .map(|(id, record)| FileSummary::from_record(id.as_str(), record))
        .collect())
}

/// Resolve an owned file and open its bytes
///
/// Unknown ids, other users' files and records whose bytes are gone all
/// surface as `FileNotFound`.
pub async fn open_download(state: &AppState, owner: &User, file_id: &str) -> Result<Download> {
    let record = files::find_owned(&state.db, owner.id.clone(), file_id.to_string())
        .await?
        .ok_or(AppError::FileNotFound)?;

    let (file, size) = state.content.open_file(&record.stored_name).await?;

    tracing::info!("File {} served to user {}: {} bytes", file_id, owner.id, size);

    Ok(Download {
        original_name: record.original_name,
        file_type: record.file_type,
        size,
        file,
    })
}
