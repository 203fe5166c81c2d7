use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::BACKUP_ID_LEN;

/// Backup record: an opaque document guarded by a password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Client-chosen 16-character alphanumeric id
    pub id: String,
    /// PHC-format Argon2id hash of the owner's password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Stored payload, replaced wholesale on every update
    pub data: Value,
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// When the backup was last written
    pub updated_at: DateTime<Utc>,
    /// Best-effort address of the last writer
    pub last_ip: Option<String>,
}

impl BackupRecord {
    /// Validate that an id is exactly 16 ASCII letters or digits
    pub fn validate_id(id: &str) -> bool {
        id.len() == BACKUP_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

/// Values for inserting a new backup
#[derive(Debug, Clone)]
pub struct NewBackup {
    pub id: String,
    pub password_hash: String,
    pub data: Value,
    pub last_ip: String,
    pub created_at: DateTime<Utc>,
}

/// Body of an upsert request
///
/// Both fields are optional at the serde level so that absence can be
/// reported as missing fields rather than a parse failure. A JSON `null`
/// for `data` counts as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertRequest {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl UpsertRequest {
    /// Return `(password, data)` when both are present and the password is
    /// non-empty
    pub fn into_fields(self) -> Option<(String, Value)> {
        match (self.password, self.data) {
            (Some(password), Some(data)) if !password.is_empty() && !data.is_null() => {
                Some((password, data))
            }
            _ => None,
        }
    }
}

/// Whether an upsert created a record or overwrote an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}
