pub mod file;
pub mod user;

pub use file::{FileRecord, FileSummary, UploadedFile};
pub use user::{User, UserRecord};
