use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};

use super::{Db, decode, encode, tables};
use crate::error::{AppError, Result};
use crate::models::FileRecord;

/// Persist a file record and link it into the owner's file list
///
/// Both writes share one transaction. The owner is re-checked inside it; an
/// owner that vanished since authentication yields `Unauthorized`.
pub async fn insert_file(db: &Db, file_id: String, record: FileRecord) -> Result<()> {
    let db = db.clone();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let write_txn = db.begin_write()?;
        {
            let users = write_txn.open_table(tables::USERS)?;
            if users.get(record.owner_id.as_str())?.is_none() {
                tracing::warn!("File record for non-existent user: {}", record.owner_id);
                return Err(AppError::Unauthorized);
            }
            drop(users);

            let mut files = write_txn.open_table(tables::FILES)?;
            let bytes = encode(&record)?;
            files.insert(file_id.as_str(), bytes.as_slice())?;
            drop(files);

            let mut user_files = write_txn.open_table(tables::USER_FILES)?;
            let mut ids: Vec<String> = user_files
                .get(record.owner_id.as_str())?
                .map(|b| decode(b.value()))
                .transpose()?
                .unwrap_or_default();
            ids.push(file_id);
            let ids_bytes = encode(&ids)?;
            user_files.insert(record.owner_id.as_str(), ids_bytes.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    })
    .await?
}

/// All records owned by `owner_id`, most recent upload first
///
/// Uploads sharing a timestamp keep reverse upload order.
pub async fn list_for_owner(db: &Db, owner_id: String) -> Result<Vec<(String, FileRecord)>> {
    let db = db.clone();

    tokio::task::spawn_blocking(move || -> Result<Vec<(String, FileRecord)>> {
        let read_txn = db.begin_read()?;
        let user_files = read_txn.open_table(tables::USER_FILES)?;
        let ids: Vec<String> = user_files
            .get(owner_id.as_str())?
            .map(|b| decode(b.value()))
            .transpose()?
            .unwrap_or_default();

        let files = read_txn.open_table(tables::FILES)?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids.into_iter().rev() {
            let Some(bytes) = files.get(id.as_str())? else {
                tracing::warn!("Owner index references missing file record: {}", id);
                continue;
            };
            let record: FileRecord = decode(bytes.value())?;
            // Index and record must agree on ownership
            if record.owner_id == owner_id {
                records.push((id, record));
            }
        }

        // Stable sort keeps reverse insertion order for equal timestamps
        records.sort_by(|a, b| b.1.uploaded_at.cmp(&a.1.uploaded_at));

        Ok(records)
    })
    .await?
}

/// Fetch a record only if it belongs to `owner_id`
///
/// Missing records and records of other users are both `None`.
pub async fn find_owned(db: &Db, owner_id: String, file_id: String) -> Result<Option<FileRecord>> {
    let db = db.clone();

    tokio::task::spawn_blocking(move || -> Result<Option<FileRecord>> {
        let read_txn = db.begin_read()?;
        let files = read_txn.open_table(tables::FILES)?;

        let record = files
            .get(file_id.as_str())?
            .map(|b| decode::<FileRecord>(b.value()))
            .transpose()?;

        Ok(record.filter(|r| r.owner_id == owner_id))
    })
    .await?
}

/// Number of stored file records
pub async fn count_files(db: &Db) -> Result<u64> {
    let db = db.clone();

    tokio::task::spawn_blocking(move || -> Result<u64> {
        let read_txn = db.begin_read()?;
        let files = read_txn.open_table(tables::FILES)?;
        Ok(files.len()?)
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_database, users};
    use tempfile::TempDir;

    fn record(owner_id: &str, name: &str, uploaded_at: i64) -> FileRecord {
        FileRecord {
            owner_id: owner_id.to_string(),
            original_name: name.to_string(),
            stored_name: format!("{}-stored", name),
            file_type: "stl".to_string(),
            size: 10,
            uploaded_at,
        }
    }

    async fn setup() -> (TempDir, Db, String, String) {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("files.db")).unwrap();
        let alice = users::insert_user(&db, "alice".into(), "a@x.com".into(), "h".into())
            .await
            .unwrap();
        let bob = users::insert_user(&db, "bob".into(), "b@x.com".into(), "h".into())
            .await
            .unwrap();
        (temp_dir, db, alice, bob)
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let (_dir, db, alice, _bob) = setup().await;

        insert_file(&db, "f1".into(), record(&alice, "old.stl", 1_000))
            .await
            .unwrap();
        insert_file(&db, "f2".into(), record(&alice, "new.stl", 3_000))
            .await
            .unwrap();
        insert_file(&db, "f3".into(), record(&alice, "mid.stl", 2_000))
            .await
            .unwrap();

        let ids: Vec<String> = list_for_owner(&db, alice)
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["f2", "f3", "f1"]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_list_latest_upload_first() {
        let (_dir, db, alice, _bob) = setup().await;

        insert_file(&db, "first".into(), record(&alice, "a.stl", 5_000))
            .await
            .unwrap();
        insert_file(&db, "second".into(), record(&alice, "a.stl", 5_000))
            .await
            .unwrap();

        let ids: Vec<String> = list_for_owner(&db, alice)
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let (_dir, db, alice, bob) = setup().await;

        insert_file(&db, "a1".into(), record(&alice, "a.stl", 1))
            .await
            .unwrap();
        insert_file(&db, "b1".into(), record(&bob, "b.stl", 2))
            .await
            .unwrap();

        let alice_files = list_for_owner(&db, alice).await.unwrap();
        assert_eq!(alice_files.len(), 1);
        assert_eq!(alice_files[0].1.original_name, "a.stl");
    }

    #[tokio::test]
    async fn test_list_empty_for_user_without_uploads() {
        let (_dir, db, alice, _bob) = setup().await;
        assert!(list_for_owner(&db, alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_owned_hides_other_users_files() {
        let (_dir, db, alice, bob) = setup().await;

        insert_file(&db, "b1".into(), record(&bob, "b.stl", 1))
            .await
            .unwrap();

        assert!(find_owned(&db, bob, "b1".into()).await.unwrap().is_some());
        assert!(find_owned(&db, alice.clone(), "b1".into()).await.unwrap().is_none());
        assert!(find_owned(&db, alice, "missing".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_for_unknown_owner_rejected() {
        let (_dir, db, _alice, _bob) = setup().await;

        let result = insert_file(&db, "x".into(), record("ghost", "x.stl", 1)).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert_eq!(count_files(&db).await.unwrap(), 0);
    }
}
