use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// File metadata record stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub owner_id: String,
    /// Client-supplied name, only ever used for display and downloads
    pub original_name: String,
    /// Server-generated key of the bytes in the content area
    pub stored_name: String,
    pub file_type: String,
    pub size: u64,
    /// Unix timestamp in milliseconds
    pub uploaded_at: i64,
}

/// Listing entry returned to the owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: String,
    pub original_name: String,
    pub upload_date: String,
    pub file_type: String,
    pub size: u64,
}

impl FileSummary {
    pub fn from_record(id: impl Into<String>, record: &FileRecord) -> Self {
        Self {
            id: id.into(),
            original_name: record.original_name.clone(),
            upload_date: millis_to_rfc3339(record.uploaded_at),
            file_type: record.file_type.clone(),
            size: record.size,
        }
    }
}

/// Upload acknowledgement; the storage name stays server-side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub original_name: String,
    pub upload_date: String,
}

/// Convert a millisecond Unix timestamp to RFC3339, defaulting to now if invalid
pub fn millis_to_rfc3339(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Strip any directory components a client put in front of the file name
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_original_name(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." || name.chars().any(char::is_control) {
        return None;
    }

    Some(name.to_string())
}

/// Lower-cased extension of a file name without the leading dot
pub fn file_type_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Generate a fresh storage name: 128 random bits plus the file type
///
/// The extension is only kept when it is plain ASCII alphanumeric, so the
/// name never carries separators or other attacker-chosen characters.
pub fn generate_storage_name(file_type: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    if !file_type.is_empty() && file_type.chars().all(|c| c.is_ascii_alphanumeric()) {
        format!("{}.{}", id, file_type)
    } else {
        id
    }
}

/// MIME type served for a stored file type
pub fn content_type_for(file_type: &str) -> &'static str {
    match file_type {
        "stl" => "model/stl",
        "obj" => "model/obj",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_of() {
        assert_eq!(file_type_of("model.stl"), "stl");
        assert_eq!(file_type_of("model.OBJ"), "obj");
        assert_eq!(file_type_of("Bracket.v2.Stl"), "stl");
        assert_eq!(file_type_of("README"), "");
        assert_eq!(file_type_of(".hidden"), "");
    }

    #[test]
    fn test_sanitize_original_name() {
        assert_eq!(sanitize_original_name("model.stl").as_deref(), Some("model.stl"));
        assert_eq!(
            sanitize_original_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_original_name("C:\\Users\\me\\part.obj").as_deref(),
            Some("part.obj")
        );
        assert_eq!(sanitize_original_name(""), None);
        assert_eq!(sanitize_original_name("dir/"), None);
        assert_eq!(sanitize_original_name(".."), None);
        assert_eq!(sanitize_original_name("bad\nname.stl"), None);
    }

    #[test]
    fn test_generate_storage_name() {
        let a = generate_storage_name("stl");
        let b = generate_storage_name("stl");

        assert_ne!(a, b);
        assert!(a.ends_with(".stl"));
        // 32 hex chars of UUID + ".stl"
        assert_eq!(a.len(), 36);
        assert!(a[..32].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_storage_name_drops_unsafe_extension() {
        let name = generate_storage_name("s/l");
        assert_eq!(name.len(), 32);
        assert!(!name.contains('/'));

        let bare = generate_storage_name("");
        assert_eq!(bare.len(), 32);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("stl"), "model/stl");
        assert_eq!(content_type_for("obj"), "model/obj");
        assert_eq!(content_type_for("bin"), "application/octet-stream");
    }

    #[test]
    fn test_summary_never_exposes_storage_name() {
        let record = FileRecord {
            owner_id: "owner".to_string(),
            original_name: "part.stl".to_string(),
            stored_name: "0123456789abcdef0123456789abcdef.stl".to_string(),
            file_type: "stl".to_string(),
            size: 42,
            uploaded_at: 1_733_788_800_000,
        };

        let summary = FileSummary::from_record("file-1", &record);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["originalName"], "part.stl");
        assert_eq!(json["fileType"], "stl");
        assert_eq!(json["size"], 42);
        assert_eq!(json["uploadDate"], "2024-12-10T00:00:00.000Z");
        assert!(!json.to_string().contains(&record.stored_name));
    }
}
