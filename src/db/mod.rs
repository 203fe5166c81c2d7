pub mod memory;
pub mod pool;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{BackupRecord, NewBackup};

pub use memory::MemoryStore;
pub use pool::create_pool;
pub use postgres::PgStore;

/// Shared store handle injected into the application state
pub type Db = Arc<dyn Store>;

/// Errors raised by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Backup already exists: {0}")]
    DuplicateId(String),
}

/// A data store that hands out one scoped session per request.
///
/// Dropping the returned session releases whatever resource backs it, so
/// every exit path of a handler gives the connection back.
#[async_trait]
pub trait Store: Send + Sync {
    /// Acquire a session for the duration of one request
    async fn acquire(&self) -> Result<Box<dyn StoreSession>, StoreError>;

    /// Check that the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Delete rate-limit events recorded before `before`, returning how many
    /// were removed
    async fn prune_events(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Operations available while a session is held
#[async_trait]
pub trait StoreSession: Send {
    /// Count events for `ip` recorded at or after `since`
    async fn count_events_since(&mut self, ip: &str, since: DateTime<Utc>)
        -> Result<u64, StoreError>;

    /// Append a rate-limit event; the store stamps the time
    async fn record_event(&mut self, ip: &str, action: &str) -> Result<(), StoreError>;

    /// Look up a backup by id
    async fn find_backup(&mut self, id: &str) -> Result<Option<BackupRecord>, StoreError>;

    /// Insert a new backup; fails with `DuplicateId` if the id is taken
    async fn insert_backup(&mut self, backup: &NewBackup) -> Result<(), StoreError>;

    /// Replace the payload of an existing backup
    async fn update_backup(
        &mut self,
        id: &str,
        data: &Value,
        last_ip: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
