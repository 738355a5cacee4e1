pub mod admin;
pub mod auth;
pub mod files;
pub mod health;

pub use admin::admin_stats;
pub use auth::{login_user, register_user};
pub use files::{download_file, list_files, upload_file};
pub use health::health_check;
