pub mod health;
pub mod sync;
pub mod validation;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{any, get},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use health::health_check;
pub use sync::sync_backup;
pub use validation::{parse_upsert_body, validated_id};

/// Build the application router
///
/// CORS allows every origin; preflights are answered by the CORS layer
/// before they reach the sync handler.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let body_limit = DefaultBodyLimit::max(state.config.max_body_bytes);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/sync", any(sync_backup))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(body_limit),
        )
        .with_state(state)
}
