//! Interview Sync Server Library
//!
//! Password-protected backup storage for the mock-interview web app. This
//! module exports the core types and functions for testing and reuse.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;
pub mod service;

pub use config::Config;
pub use db::{Db, MemoryStore, PgStore, Store, StoreError, StoreSession};
pub use error::{AppError, Result};
pub use routes::router;
pub use service::SyncService;

use std::sync::Arc;

use security::{ClientIdentityResolver, ForwardedForResolver, PasswordError, PeerAddrResolver};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub service: Arc<SyncService>,
    pub identity: Arc<dyn ClientIdentityResolver>,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given store and configuration
    pub fn new(db: Db, config: Config) -> std::result::Result<Self, PasswordError> {
        let service = SyncService::from_config(&config)?;
        let identity: Arc<dyn ClientIdentityResolver> = if config.trust_forwarded_headers {
            Arc::new(ForwardedForResolver)
        } else {
            Arc::new(PeerAddrResolver)
        };

        Ok(Self {
            db,
            service: Arc::new(service),
            identity,
            config,
        })
    }
}
