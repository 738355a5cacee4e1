//! CADzilla server library
//!
//! Authenticated upload, listing and download of 3D model files. Exposes the
//! router and core types for the binary and for tests.

pub mod config;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use db::{Db, open_database};
pub use error::{AppError, Result};
pub use storage::ContentStore;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use constants::MULTIPART_OVERHEAD_BYTES;
use security::TokenService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub content: ContentStore,
    pub tokens: TokenService,
}

impl AppState {
    /// Create a new AppState; the token service is keyed from the config
    pub fn new(db: Db, config: Config, content: ContentStore) -> Self {
        let tokens = TokenService::new(
            &config.jwt_secret,
            chrono::Duration::days(config.token_ttl_days),
        );
        Self {
            db,
            config,
            content,
            tokens,
        }
    }
}

/// Build the full HTTP router
pub fn build_router(state: AppState) -> Router {
    let upload_limit = usize::try_from(
        state
            .config
            .max_upload_bytes
            .saturating_add(MULTIPART_OVERHEAD_BYTES),
    )
    .unwrap_or(usize::MAX);

    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let log_requests = state.config.log_requests;

    let router = Router::new()
        .route("/health", get(routes::health_check))
        .route("/admin/stats", get(routes::admin_stats))
        .route("/api/auth/register", post(routes::register_user))
        .route("/api/auth/login", post(routes::login_user))
        .route(
            "/api/files/upload",
            post(routes::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/files", get(routes::list_files))
        .route("/api/files/{id}", get(routes::download_file))
        .layer(cors)
        .with_state(state);

    if log_requests {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
