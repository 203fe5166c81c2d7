use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::{Store, StoreError, StoreSession};
use crate::models::{BackupRecord, NewBackup, RateLimitEvent};

/// In-process store for development and tests.
///
/// Clones share the same tables. Sessions are counted while alive, and
/// failures can be injected into the event log or the backup table.
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    tables: RwLock<Tables>,
    open_sessions: AtomicUsize,
    backup_queries: AtomicUsize,
    fail_event_log: AtomicBool,
    fail_backups: AtomicBool,
}

#[derive(Default)]
struct Tables {
    backups: HashMap<String, BackupRecord>,
    events: Vec<RateLimitEvent>,
    next_event_id: i64,
}

impl Tables {
    fn push_event(&mut self, ip: &str, action: &str, timestamp: DateTime<Utc>) {
        self.next_event_id += 1;
        self.events.push(RateLimitEvent {
            id: self.next_event_id,
            ip: ip.to_string(),
            action: action.to_string(),
            timestamp,
        });
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions acquired and not yet dropped
    pub fn open_sessions(&self) -> usize {
        self.shared.open_sessions.load(Ordering::SeqCst)
    }

    /// Number of calls made against the backup table
    pub fn backup_queries(&self) -> usize {
        self.shared.backup_queries.load(Ordering::SeqCst)
    }

    /// Snapshot of a stored backup
    pub fn backup(&self, id: &str) -> Option<BackupRecord> {
        self.shared.tables.read().backups.get(id).cloned()
    }

    /// Number of events recorded for `ip`, regardless of age
    pub fn event_count(&self, ip: &str) -> usize {
        self.shared
            .tables
            .read()
            .events
            .iter()
            .filter(|event| event.ip == ip)
            .count()
    }

    /// Record an event with an explicit timestamp
    pub fn insert_event_at(&self, ip: &str, action: &str, timestamp: DateTime<Utc>) {
        self.shared.tables.write().push_event(ip, action, timestamp);
    }

    /// Make event counting and recording fail
    pub fn fail_event_log(&self, fail: bool) {
        self.shared.fail_event_log.store(fail, Ordering::SeqCst);
    }

    /// Make every backup table operation fail
    pub fn fail_backups(&self, fail: bool) {
        self.shared.fail_backups.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn acquire(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        self.shared.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            shared: self.shared.clone(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn prune_events(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.shared.tables.write();
        let len = tables.events.len();
        tables.events.retain(|event| event.timestamp >= before);
        Ok((len - tables.events.len()) as u64)
    }
}

/// Session over a [`MemoryStore`]; decrements the open count on drop
pub struct MemorySession {
    shared: Arc<Shared>,
}

impl MemorySession {
    fn check_event_log(&self) -> Result<(), StoreError> {
        if self.shared.fail_event_log.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("event log offline".to_string()));
        }
        Ok(())
    }

    fn check_backups(&self) -> Result<(), StoreError> {
        self.shared.backup_queries.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_backups.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("backup table offline".to_string()));
        }
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.shared.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn count_events_since(
        &mut self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.check_event_log()?;
        let tables = self.shared.tables.read();
        let count = tables
            .events
            .iter()
            .filter(|event| event.ip == ip && event.timestamp >= since)
            .count();
        Ok(count as u64)
    }

    async fn record_event(&mut self, ip: &str, action: &str) -> Result<(), StoreError> {
        self.check_event_log()?;
        self.shared.tables.write().push_event(ip, action, Utc::now());
        Ok(())
    }

    async fn find_backup(&mut self, id: &str) -> Result<Option<BackupRecord>, StoreError> {
        self.check_backups()?;
        Ok(self.shared.tables.read().backups.get(id).cloned())
    }

    async fn insert_backup(&mut self, backup: &NewBackup) -> Result<(), StoreError> {
        self.check_backups()?;
        let mut tables = self.shared.tables.write();
        if tables.backups.contains_key(&backup.id) {
            return Err(StoreError::DuplicateId(backup.id.clone()));
        }
        tables.backups.insert(
            backup.id.clone(),
            BackupRecord {
                id: backup.id.clone(),
                password_hash: backup.password_hash.clone(),
                data: backup.data.clone(),
                created_at: backup.created_at,
                updated_at: backup.created_at,
                last_ip: Some(backup.last_ip.clone()),
            },
        );
        Ok(())
    }

    async fn update_backup(
        &mut self,
        id: &str,
        data: &Value,
        last_ip: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_backups()?;
        if let Some(record) = self.shared.tables.write().backups.get_mut(id) {
            record.data = data.clone();
            record.updated_at = updated_at;
            record.last_ip = Some(last_ip.to_string());
        }
        Ok(())
    }
}
