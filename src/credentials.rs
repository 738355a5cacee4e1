//! User registration and password checks on top of the users tables.

use std::sync::OnceLock;

use crate::constants::ERR_FIELDS_REQUIRED;
use crate::db::{Db, users};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{hash_password, verify_password};

/// Register a new user
///
/// Username and email are trimmed; the password is hashed as supplied.
/// Nothing about the stored user is returned.
pub async fn register(db: &Db, username: &str, email: &str, password: &str) -> Result<()> {
    let username = username.trim().to_string();
    let email = email.trim().to_string();

    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::InvalidInput(ERR_FIELDS_REQUIRED.to_string()));
    }

    let password = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let user_id = users::insert_user(db, username, email, password_hash).await?;
    tracing::info!("New user registered: {}", user_id);

    Ok(())
}

/// Check an email/password pair and return the matching user
///
/// An unknown email and a wrong password produce the same
/// `InvalidCredentials`, and both pay for one hash verification.
pub async fn verify_credentials(db: &Db, email: &str, password: &str) -> Result<User> {
    let found = users::find_by_email(db, email.trim().to_string()).await?;
    let password = password.to_string();

    let Some((user_id, record)) = found else {
        tokio::task::spawn_blocking(move || {
            if let Some(hash) = dummy_hash() {
                let _ = verify_password(hash, &password);
            }
        })
        .await?;
        tracing::info!("Failed login attempt");
        return Err(AppError::InvalidCredentials);
    };

    let hash = record.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &password)).await?;
    if !matches {
        tracing::info!("Failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    Ok(User::from_record(user_id, record))
}

/// Resolve a user id to its identity, if the user still exists
pub async fn find_user(db: &Db, user_id: &str) -> Result<Option<User>> {
    let record = users::find_by_id(db, user_id.to_string()).await?;
    Ok(record.map(|record| User::from_record(user_id, record)))
}

/// Hash verified against when the email is unknown, so both failure paths
/// take comparable time
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("cadzilla-timing-equaliser").ok())
        .as_deref()
}
