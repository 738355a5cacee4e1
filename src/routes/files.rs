use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use tokio_util::io::ReaderStream;

use crate::constants::{ERR_NO_FILE, UPLOAD_FIELD_NAME};
use crate::error::{AppError, Result};
use crate::extract::AuthUser;
use crate::models::file::content_type_for;
use crate::models::{FileSummary, UploadedFile};
use crate::services;
use crate::AppState;

/// Upload a single model file
///
/// POST /api/files/upload (multipart, file in the `model` field)
///
/// Other form fields are skipped. Returns 201 with `{id, originalName,
/// uploadDate}`, 400 when no file part is present.
pub async fn upload_file(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedFile>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let content = field.map_err(stream_error);
        let uploaded = services::upload(&state, &user, &file_name, content).await?;

        return Ok((StatusCode::CREATED, Json(uploaded)));
    }

    Err(AppError::InvalidInput(ERR_NO_FILE.to_string()))
}

/// Errors while reading the file part itself
fn stream_error(err: MultipartError) -> AppError {
    match AppError::from(err) {
        AppError::InvalidMultipart(msg) => AppError::UploadInterrupted(msg),
        other => other,
    }
}

/// List the caller's files, most recent first
///
/// GET /api/files
pub async fn list_files(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<FileSummary>>> {
    let files = services::list_files(&state, &user).await?;
    Ok(Json(files))
}

/// Stream one of the caller's files under its original name
///
/// GET /api/files/{id}
///
/// 404 when the id is unknown or belongs to someone else.
pub async fn download_file(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(file_id): Path<String>,
) -> Result<Response> {
    let download = services::open_download(&state, &user, &file_id).await?;

    let headers = [
        (
            CONTENT_TYPE,
            HeaderValue::from_static(content_type_for(&download.file_type)),
        ),
        (CONTENT_LENGTH, HeaderValue::from(download.size)),
        (
            CONTENT_DISPOSITION,
            content_disposition(&download.original_name),
        ),
    ];
    let body = Body::from_stream(ReaderStream::new(download.file));

    Ok((headers, body).into_response())
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name
fn content_disposition(original_name: &str) -> HeaderValue {
    let fallback: String = original_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(original_name.len() * 3);
    for byte in original_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
