use std::env;

use crate::constants::{
    DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TOKEN_TTL_DAYS,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    /// Directory holding uploaded model bytes, keyed by storage name
    pub upload_dir: String,
    pub allowed_origins: Vec<String>,
    /// HS256 key used to sign and verify bearer tokens
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub max_upload_bytes: u64,
    /// Lower-cased extensions accepted on upload (empty = accept anything)
    pub allowed_extensions: Vec<String>,
    pub environment: String,
    /// Admin secret key for protected admin endpoints (optional)
    /// If not set, admin endpoints are disabled
    pub admin_secret_key: Option<String>,
    /// Enable HTTP request logging (default: false)
    pub log_requests: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "5890".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/cadzilla.db".to_string());

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

        let allowed_origins = split_list(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set for token signing")?;
        if jwt_secret.trim().is_empty() {
            return Err("JWT_SECRET must not be empty".to_string());
        }

        let token_ttl_days = env::var("TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_TOKEN_TTL_DAYS.to_string())
            .parse::<i64>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or("Invalid TOKEN_TTL_DAYS")?;

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .map_err(|_| "Invalid MAX_UPLOAD_BYTES")?;

        let allowed_extensions = split_list(
            &env::var("ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_EXTENSIONS.to_string()),
        )
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let admin_secret_key = env::var("ADMIN_SECRET_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let log_requests = env::var("LOG_REQUESTS")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Ok(Config {
            server_host,
            server_port,
            database_path,
            upload_dir,
            allowed_origins,
            jwt_secret,
            token_ttl_days,
            max_upload_bytes,
            allowed_extensions,
            environment,
            admin_secret_key,
            log_requests,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Whether an upload with the given (lower-cased) extension is accepted
    pub fn accepts_extension(&self, file_type: &str) -> bool {
        self.allowed_extensions.is_empty()
            || self.allowed_extensions.iter().any(|ext| ext == file_type)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
