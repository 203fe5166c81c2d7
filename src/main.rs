use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use interview_sync_server::db::create_pool;
use interview_sync_server::service::spawn_event_pruner;
use interview_sync_server::{router, AppState, Config, Db, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_sync_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Interview Sync Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );
    tracing::info!(
        "Rate limit: {} requests per {}s per client",
        config.rate_limit_requests,
        config.rate_limit_window_secs
    );

    // Open the store
    let db: Db = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.database_max_connections).await?;
            let store = PgStore::new(pool);

            tracing::info!("Running database migrations...");
            store.migrate().await?;
            tracing::info!("Migrations complete");

            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(retention) = config.effective_event_retention_secs() {
        tracing::info!("Pruning rate limit events older than {}s", retention);
        spawn_event_pruner(
            db.clone(),
            chrono::Duration::seconds(retention as i64),
            std::time::Duration::from_secs(config.event_prune_interval_secs),
        );
    }

    // Create app state and router
    let state = AppState::new(db, config.clone())?;
    let app = router(state);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
