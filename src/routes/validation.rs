use axum::http::HeaderMap;
use serde_json::Value;

use crate::constants::SYNC_ID_HEADER;
use crate::error::{AppError, Result};
use crate::models::{BackupRecord, UpsertRequest};

/// Pick the backup id from the query string, falling back to the
/// `X-Sync-Id` header, and check its format
pub fn validated_id(query_id: Option<&str>, headers: &HeaderMap) -> Result<String> {
    let id = query_id
        .filter(|id| !id.is_empty())
        .or_else(|| {
            headers
                .get(SYNC_ID_HEADER)
                .and_then(|value| value.to_str().ok())
        })
        .ok_or(AppError::InvalidId)?;

    if !BackupRecord::validate_id(id) {
        tracing::debug!("Rejected malformed backup id");
        return Err(AppError::InvalidId);
    }

    Ok(id.to_string())
}

/// Parse an upsert body; an empty body is treated as having no fields
pub fn parse_upsert_body(body: &[u8]) -> Result<UpsertRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpsertRequest::default());
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| AppError::MalformedBody(e.to_string()))?;
    if !value.is_object() {
        return Err(AppError::MalformedBody("body is not an object".to_string()));
    }

    serde_json::from_value(value).map_err(|e| AppError::MalformedBody(e.to_string()))
}
