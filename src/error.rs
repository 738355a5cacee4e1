use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Every failure a request can end in
///
/// Client-caused variants map to 4xx with a readable message; the rest are
/// server faults and answer a generic 500.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("redb: {0}")]
    Database(#[from] redb::Error),

    #[error("redb transaction: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("redb table: {0}")]
    Table(#[from] redb::TableError),

    #[error("redb storage: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("redb commit: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Record encoding failed: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Record decoding failed: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Blocking task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// Reading or writing model bytes in the content area failed
    #[error("Content I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Username or email already in use")]
    UserAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("File not found")]
    FileNotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Invalid multipart payload: {0}")]
    InvalidMultipart(String),

    #[error("Upload interrupted: {0}")]
    UploadInterrupted(String),

    #[error("Payload too large")]
    PayloadTooLarge,
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::InvalidMultipart(err.body_text())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::UserAlreadyExists => (
                StatusCode::BAD_REQUEST,
                "Username or email already in use".to_string(),
            ),
            AppError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "Invalid credentials".to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::FileNotFound => (StatusCode::NOT_FOUND, "File not found".to_string()),
            AppError::InvalidInput(msg)
            | AppError::InvalidMultipart(msg)
            | AppError::UploadInterrupted(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UnsupportedFileType(file_type) => (
                StatusCode::BAD_REQUEST,
                format!("Unsupported file format: {}", file_type),
            ),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "File size exceeds maximum allowed".to_string(),
            ),
            // Storage, crypto and runtime faults: logged in full, opaque to clients
            internal => {
                tracing::error!("Request failed: {}", internal);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
