use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{ERR_INVALID_ID, ERR_MALFORMED_BODY, ERR_MISSING_FIELDS};
use crate::db::StoreError;
use crate::security::PasswordError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Invalid id")]
    InvalidId,

    #[error("Missing fields")]
    MissingFields,

    #[error("Malformed body: {0}")]
    MalformedBody(String),

    #[error("Backup not found")]
    NotFound,

    #[error("Invalid password")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Store(ref e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Password(ref e) => {
                tracing::error!("Password error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::InvalidId => (StatusCode::BAD_REQUEST, ERR_INVALID_ID),
            AppError::MissingFields => (StatusCode::BAD_REQUEST, ERR_MISSING_FIELDS),
            AppError::MalformedBody(ref reason) => {
                tracing::debug!("Malformed body: {}", reason);
                (StatusCode::BAD_REQUEST, ERR_MALFORMED_BODY)
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Backup not found"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid password"),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded - too many requests",
            ),
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
