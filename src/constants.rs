/// Length of a backup id (capability token)
pub const BACKUP_ID_LEN: usize = 16;

/// Header that may carry the backup id when it is not in the query string
pub const SYNC_ID_HEADER: &str = "x-sync-id";

/// Default maximum request body size in bytes (5MB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 5_242_880;

/// Warning threshold for large payloads (1MB)
/// Log when backups exceed this size for monitoring
pub const WARN_BACKUP_SIZE_BYTES: usize = 1_048_576;

/// Default number of requests allowed per client within the window.
/// Deliberately permissive for development; operators should tune it.
pub const DEFAULT_RATE_LIMIT_REQUESTS: u64 = 100;

/// Default trailing rate-limit window (1 hour)
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 3600;

/// Longest rate-limit event retention honoured (about 100 years)
pub const MAX_EVENT_RETENTION_SECS: u64 = 100 * 365 * 24 * 3600;

/// Identity used when no client address can be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a missing or malformed backup id
pub const ERR_INVALID_ID: &str = "Invalid or missing id (must be 16 alphanumeric characters)";

/// Error message when password or data is absent from an upsert
pub const ERR_MISSING_FIELDS: &str = "Missing password or data";

/// Error message for a request body that is not a JSON object
pub const ERR_MALFORMED_BODY: &str = "Request body must be a JSON object";

/// Response message for a newly created backup
pub const MSG_BACKUP_CREATED: &str = "Backup created";

/// Response message for an overwritten backup
pub const MSG_BACKUP_UPDATED: &str = "Backup updated";
