use serde::{Deserialize, Serialize};

/// User record stored in redb
/// Uses Unix timestamp for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    /// Argon2 PHC string; the plaintext password is never stored
    pub password_hash: String,
    /// When the user was created (Unix timestamp)
    pub created_at: i64,
}

/// Resolved identity handed to protected handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl User {
    pub fn from_record(id: impl Into<String>, record: UserRecord) -> Self {
        Self {
            id: id.into(),
            username: record.username,
            email: record.email,
        }
    }
}
