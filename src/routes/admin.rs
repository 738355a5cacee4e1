use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::db::{files, users};
use crate::{AppError, AppState, error::Result};

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub user_count: u64,
    pub file_count: u64,
    pub database_size_bytes: u64,
    pub database_size_human: String,
    pub content_size_bytes: u64,
    pub content_size_human: String,
}

/// Render a byte count with a binary unit, two decimals above 1 KB
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Users, files and disk usage of this deployment
///
/// GET /admin/stats?key=<ADMIN_SECRET_KEY>
///
/// 401 when the key is wrong or no admin key is configured.
pub async fn admin_stats(
    State(state): State<AppState>,
    Query(params): Query<AdminQuery>,
) -> Result<Json<AdminStatsResponse>> {
    match state.config.admin_secret_key.as_deref() {
        Some(key) if key == params.key => {}
        Some(_) => {
            tracing::warn!("Rejected admin stats request with wrong key");
            return Err(AppError::Unauthorized);
        }
        None => return Err(AppError::Unauthorized),
    }

    let database_size_bytes = fs::metadata(&state.config.database_path)
        .map(|m| m.len())
        .unwrap_or(0);
    let content_size_bytes = state.content.usage_bytes().await?;

    let user_count = users::count_users(&state.db).await?;
    let file_count = files::count_files(&state.db).await?;

    tracing::info!(
        "Admin stats requested: {} users, {} files, {} content",
        user_count,
        file_count,
        format_bytes(content_size_bytes)
    );

    Ok(Json(AdminStatsResponse {
        user_count,
        file_count,
        database_size_bytes,
        database_size_human: format_bytes(database_size_bytes),
        content_size_bytes,
        content_size_human: format_bytes(content_size_bytes),
    }))
}
