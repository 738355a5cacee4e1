//! Shared fixtures for unit tests: an isolated database and content area
//! per test.

use bytes::Bytes;
use futures::{Stream, stream};
use tempfile::TempDir;

use crate::config::Config;
use crate::credentials::{register, verify_credentials};
use crate::db::open_database;
use crate::error::Result;
use crate::models::User;
use crate::storage::ContentStore;
use crate::AppState;

pub const TEST_PASSWORD: &str = "pw123456";

pub fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
        upload_dir: temp_dir.path().join("uploads").to_string_lossy().into_owned(),
        allowed_origins: vec!["http://localhost:5173".to_string()],
        jwt_secret: "unit-test-secret".to_string(),
        token_ttl_days: 7,
        max_upload_bytes: 1024 * 1024,
        allowed_extensions: vec![],
        environment: "test".to_string(),
        admin_secret_key: Some("admin-key".to_string()),
        log_requests: false,
    }
}

pub struct TestEnv {
    pub state: AppState,
    _dir: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_max_upload(max_upload_bytes: u64) -> Self {
        Self::with_config(|config| config.max_upload_bytes = max_upload_bytes).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        adjust(&mut config);

        let db = open_database(&config.database_path).unwrap();
        let content = ContentStore::open(&config.upload_dir).await.unwrap();

        Self {
            state: AppState::new(db, config, content),
            _dir: dir,
        }
    }

    /// Register `name` with a derived email and return the resolved identity
    pub async fn user(&self, name: &str) -> User {
        let email = format!("{}@x.com", name);
        register(&self.state.db, name, &email, TEST_PASSWORD)
            .await
            .unwrap();
        verify_credentials(&self.state.db, &email, TEST_PASSWORD)
            .await
            .unwrap()
    }

    /// Completed files currently in the content area
    pub fn stored_names(&self) -> Vec<String> {
        std::fs::read_dir(self.state.content.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('.'))
            .collect()
    }
}

/// Single-chunk byte stream as a multipart field would yield it
pub fn bytes_stream(data: &'static [u8]) -> impl Stream<Item = Result<Bytes>> {
    stream::iter(vec![Ok(Bytes::from_static(data))])
}
