use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, ConnectInfo, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;

use crate::constants::{MSG_BACKUP_CREATED, MSG_BACKUP_UPDATED, WARN_BACKUP_SIZE_BYTES};
use crate::error::{AppError, Result};
use crate::models::UpsertOutcome;
use crate::routes::validation::{parse_upsert_body, validated_id};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SyncParams {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchBackupResponse {
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct UpsertBackupResponse {
    pub success: bool,
    pub message: String,
}

/// Backup sync endpoint, dispatched on method
///
/// - `OPTIONS`: empty 200, nothing recorded
/// - `GET ?id=`: return the stored document
/// - `POST ?id=` with `{password, data}`: create (201) or overwrite (200)
/// - anything else: 405
///
/// Every non-preflight request passes the rate limiter first, before the
/// query string, id or body are looked at. An unparseable query string is
/// reported as an invalid id. One store session is held for the whole request
/// and released when this function returns, on every path.
pub async fn sync_backup(
    State(state): State<AppState>,
    method: Method,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    query: std::result::Result<Query<SyncParams>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }

    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let client = state.identity.resolve(&headers, peer);

    let mut session = state.db.acquire().await?;

    state
        .service
        .admit(session.as_mut(), &client, method.as_str())
        .await?;

    let query_id = query.map(|Query(params)| params.id).map_err(|rejection| {
        tracing::debug!("Rejected query string: {}", rejection);
        AppError::InvalidId
    });

    if method == Method::GET {
        let id = validated_id(query_id?.as_deref(), &headers)?;
        let data = state.service.fetch(session.as_mut(), &id).await?;

        Ok(Json(FetchBackupResponse { data }).into_response())
    } else if method == Method::POST {
        let id = validated_id(query_id?.as_deref(), &headers)?;
        let request = parse_upsert_body(&body)?;

        if body.len() > WARN_BACKUP_SIZE_BYTES {
            tracing::info!("Large backup from {} for {}: {} bytes", client, id, body.len());
        }

        let outcome = state
            .service
            .upsert(session.as_mut(), &id, request, &client)
            .await?;

        let (status, message) = match outcome {
            UpsertOutcome::Created => (StatusCode::CREATED, MSG_BACKUP_CREATED),
            UpsertOutcome::Updated => (StatusCode::OK, MSG_BACKUP_UPDATED),
        };

        Ok((
            status,
            Json(UpsertBackupResponse {
                success: true,
                message: message.to_string(),
            }),
        )
            .into_response())
    } else {
        Err(AppError::MethodNotAllowed)
    }
}
