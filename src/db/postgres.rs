use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{pool::PoolConnection, types::Json, PgPool, Postgres};

use super::{Store, StoreError, StoreSession};
use crate::models::{BackupRecord, NewBackup};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the sync tables if they do not exist yet
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn acquire(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgSession { conn }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn prune_events(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sync_rate_limits WHERE timestamp < $1")
            .bind(before)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// One pooled connection; returned to the pool on drop
pub struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[derive(sqlx::FromRow)]
struct BackupRow {
    id: String,
    password_hash: String,
    data: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_ip: Option<String>,
}

impl From<BackupRow> for BackupRecord {
    fn from(row: BackupRow) -> Self {
        BackupRecord {
            id: row.id,
            password_hash: row.password_hash,
            data: row.data.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_ip: row.last_ip,
        }
    }
}

#[async_trait]
impl StoreSession for PgSession {
    async fn count_events_since(
        &mut self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sync_rate_limits WHERE ip = $1 AND timestamp >= $2",
        )
        .bind(ip)
        .bind(since)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn record_event(&mut self, ip: &str, action: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO sync_rate_limits (ip, action) VALUES ($1, $2)")
            .bind(ip)
            .bind(action)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    async fn find_backup(&mut self, id: &str) -> Result<Option<BackupRecord>, StoreError> {
        let row = sqlx::query_as::<_, BackupRow>(
            r#"
            SELECT id, password_hash, data, created_at, updated_at, last_ip
            FROM sync_backups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(BackupRecord::from))
    }

    async fn insert_backup(&mut self, backup: &NewBackup) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sync_backups (id, password_hash, data, created_at, updated_at, last_ip)
            VALUES ($1, $2, $3, $4, $4, $5)
            "#,
        )
        .bind(&backup.id)
        .bind(&backup.password_hash)
        .bind(Json(&backup.data))
        .bind(backup.created_at)
        .bind(&backup.last_ip)
        .execute(&mut *self.conn)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
                StoreError::DuplicateId(backup.id.clone())
            }
            other => StoreError::Database(other),
        })?;

        Ok(())
    }

    async fn update_backup(
        &mut self,
        id: &str,
        data: &Value,
        last_ip: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE sync_backups
            SET data = $2, updated_at = $3, last_ip = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(data))
        .bind(updated_at)
        .bind(last_ip)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }
}
