use redb::TableDefinition;

/// Users table: user_id (UUID) -> UserRecord (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Username index: username -> user_id
/// Enforces global username uniqueness
pub const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("usernames");

/// Email index: email -> user_id
/// Enforces global email uniqueness and backs login lookups
pub const EMAILS: TableDefinition<&str, &str> = TableDefinition::new("emails");

/// Files table: file_id (UUID) -> FileRecord (serialized)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// User files index: user_id -> Vec<file_id> in upload order
pub const USER_FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("user_files");
