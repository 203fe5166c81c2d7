//! Backup sync operations, independent of the HTTP layer.

use chrono::{Duration, Utc};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::db::{Db, StoreSession};
use crate::error::{AppError, Result};
use crate::models::{BackupRecord, NewBackup, RateLimitPolicy, UpsertOutcome, UpsertRequest};
use crate::security::{PasswordError, PasswordHasher};

/// Fetch / upsert / admission logic for the sync endpoint
///
/// All operations run against a session the caller has already acquired,
/// so one request uses one connection from start to finish.
#[derive(Debug, Clone)]
pub struct SyncService {
    hasher: PasswordHasher,
    policy: RateLimitPolicy,
}

impl SyncService {
    pub fn new(hasher: PasswordHasher, policy: RateLimitPolicy) -> Self {
        Self { hasher, policy }
    }

    /// Build the service from the hashing and rate-limit settings
    pub fn from_config(config: &Config) -> std::result::Result<Self, PasswordError> {
        let hasher = PasswordHasher::new(
            config.password_hash_memory_kib,
            config.password_hash_iterations,
            config.password_hash_parallelism,
        )?;
        let policy =
            RateLimitPolicy::new(config.rate_limit_requests, config.rate_limit_window_secs);
        Ok(Self::new(hasher, policy))
    }

    /// Apply the rate limit for `client` and record this request.
    ///
    /// The event is recorded whether or not the request is admitted. Errors
    /// from counting or recording are logged and ignored, so a broken event
    /// log never blocks traffic.
    pub async fn admit(
        &self,
        session: &mut dyn StoreSession,
        client: &str,
        action: &str,
    ) -> Result<()> {
        let since = self.policy.window_start(Utc::now());

        let exceeded = match session.count_events_since(client, since).await {
            Ok(recent) => self.policy.is_exceeded(recent),
            Err(e) => {
                tracing::warn!("Rate limit check failed for {}, allowing: {}", client, e);
                false
            }
        };

        if let Err(e) = session.record_event(client, action).await {
            tracing::warn!("Failed to record rate limit event for {}: {}", client, e);
        }

        if exceeded {
            tracing::warn!(
                "Rate limit exceeded for {} (max {} per {}s)",
                client,
                self.policy.max_requests,
                self.policy.window.num_seconds()
            );
            return Err(AppError::RateLimited);
        }

        Ok(())
    }

    /// Return the stored payload for `id`
    pub async fn fetch(&self, session: &mut dyn StoreSession, id: &str) -> Result<Value> {
        if !BackupRecord::validate_id(id) {
            return Err(AppError::InvalidId);
        }

        let record = session.find_backup(id).await?.ok_or(AppError::NotFound)?;

        tracing::info!("Backup retrieved: {}", id);

        Ok(record.data)
    }

    /// Create the backup for `id`, or overwrite it when the password matches
    pub async fn upsert(
        &self,
        session: &mut dyn StoreSession,
        id: &str,
        request: UpsertRequest,
        client: &str,
    ) -> Result<UpsertOutcome> {
        if !BackupRecord::validate_id(id) {
            return Err(AppError::InvalidId);
        }

        let (password, data) = request.into_fields().ok_or(AppError::MissingFields)?;

        // Check-then-write is not atomic: concurrent writers with the right
        // password race and the last one wins.
        match session.find_backup(id).await? {
            None => {
                let hasher = self.hasher.clone();
                let password_hash =
                    tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

                let backup = NewBackup {
                    id: id.to_string(),
                    password_hash,
                    data,
                    last_ip: client.to_string(),
                    created_at: Utc::now(),
                };
                session.insert_backup(&backup).await?;

                tracing::info!("Backup created: {}", id);
                Ok(UpsertOutcome::Created)
            }
            Some(existing) => {
                let hasher = self.hasher.clone();
                let stored_hash = existing.password_hash;
                let valid = tokio::task::spawn_blocking(move || {
                    hasher.verify(&password, &stored_hash)
                })
                .await??;

                if !valid {
                    tracing::warn!("Invalid password for backup {} from {}", id, client);
                    return Err(AppError::Unauthorized);
                }

                session
                    .update_backup(id, &data, client, Utc::now())
                    .await?;

                tracing::info!("Backup updated: {}", id);
                Ok(UpsertOutcome::Updated)
            }
        }
    }
}

/// Delete rate-limit events older than `retention`
pub async fn prune_events_once(store: &Db, retention: Duration) -> Result<u64> {
    let cutoff = Utc::now() - retention;
    let removed = store.prune_events(cutoff).await?;
    if removed > 0 {
        tracing::info!("Pruned {} rate limit events older than {}", removed, cutoff);
    }
    Ok(removed)
}

/// Periodically prune old rate-limit events until the runtime shuts down
pub fn spawn_event_pruner(
    store: Db,
    retention: Duration,
    every: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = prune_events_once(&store, retention).await {
                tracing::warn!("Rate limit event pruning failed: {}", e);
            }
        }
    })
}
