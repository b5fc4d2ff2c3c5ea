use std::{path::Path, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::BoxFuture;
use sqlx::{
    query, query_as,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};

use super::CacheStore;

/// SQLite-backed store. Several processes on one host can share the file.
/// Every write also sweeps rows that have already expired, so keys that are
/// never read again do not accumulate.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(db_path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open cache database {}", db_path.display()))?;

        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        query(
            r#"
            CREATE TABLE IF NOT EXISTS analysis_cache (
                cache_key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create analysis_cache table")?;

        query(
            r#"CREATE INDEX IF NOT EXISTS idx_analysis_cache_expires_at
                ON analysis_cache (expires_at)"#,
        )
        .execute(&pool)
        .await
        .context("failed to create analysis_cache expiry index")?;

        Ok(Self { pool })
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String, i64)> =
            query_as(r#"SELECT payload, expires_at FROM analysis_cache WHERE cache_key = ?1"#)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        let Some((payload, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at <= Utc::now().timestamp_millis() {
            query(r#"DELETE FROM analysis_cache WHERE cache_key = ?1 AND expires_at <= ?2"#)
                .bind(key)
                .bind(expires_at)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        Ok(Some(payload))
    }

    async fn upsert(&self, key: &str, payload: String, ttl: Duration) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now.saturating_add(ttl_ms);

        let swept = query(r#"DELETE FROM analysis_cache WHERE expires_at <= ?1"#)
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if swept > 0 {
            tracing::debug!(target: "cache", swept, "expired cache rows removed");
        }

        query(
            r#"INSERT OR REPLACE INTO analysis_cache (cache_key, payload, expires_at)
                VALUES (?1, ?2, ?3)"#,
        )
        .bind(key)
        .bind(payload)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl CacheStore for SqliteStore {
    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(self.fetch(key))
    }

    fn store<'a>(
        &'a self,
        key: &'a str,
        payload: String,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.upsert(key, payload, ttl))
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move { self.pool.close().await })
    }
}
