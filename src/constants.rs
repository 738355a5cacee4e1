/// Bearer token lifetime when TOKEN_TTL_DAYS is not set
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Maximum upload size in bytes when MAX_UPLOAD_BYTES is not set (100MB)
/// Printable STL/OBJ meshes are typically well under this
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 104_857_600;

/// Extensions accepted when ALLOWED_EXTENSIONS is not set (empty accepts any)
pub const DEFAULT_ALLOWED_EXTENSIONS: &str = "";

/// Warning threshold for large uploads (25MB)
/// Log when uploads exceed this size for monitoring
pub const WARN_UPLOAD_SIZE_BYTES: u64 = 26_214_400;

/// Headroom on top of the file limit for multipart boundaries and headers
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Multipart form field carrying the model file
pub const UPLOAD_FIELD_NAME: &str = "model";

/// Header prefix for bearer credentials
pub const BEARER_PREFIX: &str = "Bearer ";

/// Suffix for in-flight upload files inside the content area
pub const PARTIAL_SUFFIX: &str = ".partial";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for registration with a missing field
pub const ERR_FIELDS_REQUIRED: &str = "All fields are required";

/// Error message for an upload request without a file part
pub const ERR_NO_FILE: &str = "No file uploaded";

/// Error message for a file part with an unusable name
pub const ERR_INVALID_FILE_NAME: &str = "Invalid file name";
