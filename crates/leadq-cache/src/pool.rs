//! Queue database handle
//!
//! One database file per device holds the `kv` table. The CLI and the
//! daemon each open their own [`DatabasePool`] on that file; SQLite's file
//! locking arbitrates between them and the busy timeout below bounds how
//! long a writer waits for the other process.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

/// How long a connection waits for another writer before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connections per file pool; queue writes are rare and short
const MAX_CONNECTIONS: u32 = 4;

/// SQLite pool with the `kv` schema applied
#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the database at `db_path`, creating the file and its directory
    ///
    /// # Errors
    ///
    /// `CacheError::ConnectionFailed` when the directory or the file cannot
    /// be opened, `CacheError::MigrationFailed` when the schema cannot be
    /// applied.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        ensure_parent_dir(db_path)?;

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Cannot open queue database {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        Self::apply_schema(&pool).await?;
        tracing::info!(path = %db_path.display(), "Queue database opened");

        Ok(Self { pool })
    }

    /// Private in-memory database, used by tests
    ///
    /// Limited to one connection because every `:memory:` connection is a
    /// separate database.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!("Cannot open in-memory database: {}", e))
            })?;

        Self::apply_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn apply_schema(pool: &SqlitePool) -> Result<(), CacheError> {
        sqlx::raw_sql(include_str!("migrations/20261019_initial.sql"))
            .execute(pool)
            .await
            .map_err(|e| CacheError::MigrationFailed(format!("kv schema: {}", e)))?;

        tracing::debug!("Queue schema ready");
        Ok(())
    }
}

fn ensure_parent_dir(db_path: &Path) -> Result<(), CacheError> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Cannot create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_pool_has_empty_kv_table() {
        let db = DatabasePool::in_memory().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_new_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("leadq.db");

        let _db = DatabasePool::new(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_reopening_keeps_schema_and_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leadq.db");

        let first = DatabasePool::new(&path).await.unwrap();
        sqlx::query("INSERT INTO kv (key, value, updated_at) VALUES ('k', 'v', '')")
            .execute(first.pool())
            .await
            .unwrap();
        first.pool().close().await;

        let second = DatabasePool::new(&path).await.unwrap();
        let value: String = sqlx::query_scalar("SELECT value FROM kv WHERE key = 'k'")
            .fetch_one(second.pool())
            .await
            .unwrap();
        assert_eq!(value, "v");
    }

    #[tokio::test]
    async fn test_two_pools_share_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leadq.db");

        let writer = DatabasePool::new(&path).await.unwrap();
        let reader = DatabasePool::new(&path).await.unwrap();
        sqlx::query("INSERT INTO kv (key, value, updated_at) VALUES ('k', 'v', '')")
            .execute(writer.pool())
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv")
            .fetch_one(reader.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
