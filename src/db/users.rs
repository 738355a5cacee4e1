use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use uuid::Uuid;

use super::{Db, decode, encode, tables};
use crate::error::{AppError, Result};
use crate::models::UserRecord;

/// Insert a new user, enforcing username and email uniqueness
///
/// Both indexes are checked and written in the same write transaction, so two
/// concurrent registrations cannot both claim a name. Returns the new user id.
pub async fn insert_user(
    db: &Db,
    username: String,
    email: String,
    password_hash: String,
) -> Result<String> {
    let db = db.clone();

    tokio::task::spawn_blocking(move || -> Result<String> {
        let user_id = Uuid::new_v4().to_string();

        let write_txn = db.begin_write()?;
        {
            let mut usernames = write_txn.open_table(tables::USERNAMES)?;
            let mut emails = write_txn.open_table(tables::EMAILS)?;

            if usernames.get(username.as_str())?.is_some()
                || emails.get(email.as_str())?.is_some()
            {
                return Err(AppError::UserAlreadyExists);
            }

            usernames.insert(username.as_str(), user_id.as_str())?;
            emails.insert(email.as_str(), user_id.as_str())?;

            let mut users = write_txn.open_table(tables::USERS)?;
            let record = UserRecord {
                username,
                email,
                password_hash,
                created_at: Utc::now().timestamp(),
            };
            let bytes = encode(&record)?;
            users.insert(user_id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;

        Ok(user_id)
    })
    .await?
}

/// Look up a user by email, returning the id alongside the record
pub async fn find_by_email(db: &Db, email: String) -> Result<Option<(String, UserRecord)>> {
    let db = db.clone();

    tokio::task::spawn_blocking(move || -> Result<Option<(String, UserRecord)>> {
        let read_txn = db.begin_read()?;
        let emails = read_txn.open_table(tables::EMAILS)?;

        let Some(user_id) = emails.get(email.as_str())?.map(|id| id.value().to_string()) else {
            return Ok(None);
        };

        let users = read_txn.open_table(tables::USERS)?;
        let record = users
            .get(user_id.as_str())?
            .map(|bytes| decode::<UserRecord>(bytes.value()))
            .transpose()?;

        Ok(record.map(|record| (user_id, record)))
    })
    .await?
}

/// Look up a user by id
pub async fn find_by_id(db: &Db, user_id: String) -> Result<Option<UserRecord>> {
    let db = db.clone();

    tokio::task::spawn_blocking(move || -> Result<Option<UserRecord>> {
        let read_txn = db.begin_read()?;
        let users = read_txn.open_table(tables::USERS)?;

        users
            .get(user_id.as_str())?
            .map(|bytes| decode::<UserRecord>(bytes.value()))
            .transpose()
    })
    .await?
}

/// Number of registered users
pub async fn count_users(db: &Db) -> Result<u64> {
    let db = db.clone();

    tokio::task::spawn_blocking(move || -> Result<u64> {
        let read_txn = db.begin_read()?;
        let users = read_txn.open_table(tables::USERS)?;
        Ok(users.len()?)
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_database;
    use tempfile::TempDir;

    fn test_db(temp_dir: &TempDir) -> Db {
        open_database(temp_dir.path().join("users.db")).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        let id = insert_user(&db, "alice".into(), "a@x.com".into(), "hash".into())
            .await
            .unwrap();

        let (found_id, record) = find_by_email(&db, "a@x.com".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found_id, id);
        assert_eq!(record.username, "alice");
        assert_eq!(record.password_hash, "hash");

        let by_id = find_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");
        assert_eq!(count_users(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_regardless_of_username() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        insert_user(&db, "alice".into(), "a@x.com".into(), "h".into())
            .await
            .unwrap();
        let result = insert_user(&db, "someone-else".into(), "a@x.com".into(), "h".into()).await;

        assert!(matches!(result, Err(AppError::UserAlreadyExists)));
        assert_eq!(count_users(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        insert_user(&db, "alice".into(), "a@x.com".into(), "h".into())
            .await
            .unwrap();
        let result = insert_user(&db, "alice".into(), "other@x.com".into(), "h".into()).await;

        assert!(matches!(result, Err(AppError::UserAlreadyExists)));
        // The failed attempt must not have claimed the second email
        assert!(find_by_email(&db, "other@x.com".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_lookups_return_none() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        assert!(find_by_email(&db, "nobody@x.com".into()).await.unwrap().is_none());
        assert!(find_by_id(&db, "missing".into()).await.unwrap().is_none());
    }
}
