use axum::{Json, extract::State};
use redb::ReadableDatabase;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub content_area: &'static str,
    pub version: &'static str,
}

/// Liveness of the metadata database and the content area
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.clone();
    let database = match tokio::task::spawn_blocking(move || db.begin_read().map(drop)).await {
        Ok(Ok(())) => "connected",
        Ok(Err(e)) => {
            tracing::error!("Metadata database unreadable: {}", e);
            "disconnected"
        }
        Err(e) => {
            tracing::error!("Health probe task failed: {}", e);
            "error"
        }
    };

    let content_area = if tokio::fs::metadata(state.content.root())
        .await
        .is_ok_and(|m| m.is_dir())
    {
        "available"
    } else {
        tracing::error!("Content area missing at {:?}", state.content.root());
        "missing"
    };

    let healthy = database == "connected" && content_area == "available";

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        database,
        content_area,
        version: env!("CARGO_PKG_VERSION"),
    })
}
