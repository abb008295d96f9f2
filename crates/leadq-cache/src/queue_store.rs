//! SQLite implementation of IQueueStore
//!
//! The queue is stored as a single JSON array under the `pendingLeads` key.
//! Every write replaces that one row with an upsert, which SQLite applies
//! atomically: a reader sees either the old or the new snapshot, never a
//! mix of both.
//!
//! [`IQueueStore::update`] runs inside a write transaction, so the CLI and
//! the daemon can both modify the queue of one database file without
//! overwriting each other.
//!
//! ## Record layout
//!
//! ```json
//! [{"id":"…","payload":{…},"capturedAt":"2026-10-19T14:05:09Z","attempts":0,"state":"pending"}]
//! ```

use chrono::Utc;
use sqlx::SqlitePool;

use leadq_core::domain::Record;
use leadq_core::ports::{IQueueStore, QueueMutation};

use crate::{CacheError, QUEUE_KEY};

/// SQLite-backed queue of undelivered records
#[derive(Clone)]
pub struct SqliteQueueStore {
    pool: SqlitePool,
}

impl SqliteQueueStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn read_raw(&self) -> Result<Option<String>, CacheError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(QUEUE_KEY)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }
}

/// Decodes a persisted queue snapshot
///
/// Unreadable data is an error. Returning an empty queue here would make
/// the next save wipe the records for good.
fn decode_records(raw: &str) -> Result<Vec<Record>, CacheError> {
    serde_json::from_str(raw).map_err(|e| CacheError::CorruptData {
        key: QUEUE_KEY.to_string(),
        reason: e.to_string(),
    })
}

fn encode_records(records: &[Record]) -> Result<String, CacheError> {
    serde_json::to_string(records).map_err(|e| CacheError::SerializationError(e.to_string()))
}

const UPSERT_QUEUE: &str = "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

#[async_trait::async_trait]
impl IQueueStore for SqliteQueueStore {
    async fn load_all(&self) -> anyhow::Result<Vec<Record>> {
        let records = match self.read_raw().await? {
            Some(raw) => decode_records(&raw)?,
            None => Vec::new(),
        };

        tracing::trace!(count = records.len(), "Loaded queue snapshot");
        Ok(records)
    }

    async fn save_all(&self, records: &[Record]) -> anyhow::Result<()> {
        let value = encode_records(records)?;
        let updated_at = Utc::now().to_rfc3339();

        sqlx::query(UPSERT_QUEUE)
            .bind(QUEUE_KEY)
            .bind(&value)
            .bind(&updated_at)
            .execute(&self.pool)
            .await
            .map_err(CacheError::from)?;

        tracing::trace!(count = records.len(), "Saved queue snapshot");
        Ok(())
    }

    async fn count(&self) -> anyhow::Result<usize> {
        Ok(self.load_all().await?.len())
    }

    async fn clear_all(&self) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(QUEUE_KEY)
            .execute(&self.pool)
            .await
            .map_err(CacheError::from)?;

        tracing::debug!(rows = result.rows_affected(), "Cleared queue");
        Ok(())
    }

    async fn update(&self, mutate: QueueMutation) -> anyhow::Result<Vec<Record>> {
        let mut tx = self.pool.begin().await.map_err(CacheError::from)?;

        // A write first takes the database write lock, so a second writer
        // waits on the busy timeout instead of reading a snapshot that is
        // about to go stale. Dropping `tx` on any error rolls back.
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, '[]', ?) \
             ON CONFLICT(key) DO NOTHING",
        )
        .bind(QUEUE_KEY)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(CacheError::from)?;

        let raw: String = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(QUEUE_KEY)
            .fetch_one(&mut *tx)
            .await
            .map_err(CacheError::from)?;
        let records = mutate(decode_records(&raw)?);

        sqlx::query(UPSERT_QUEUE)
            .bind(QUEUE_KEY)
            .bind(encode_records(&records)?)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(CacheError::from)?;
        tx.commit().await.map_err(CacheError::from)?;

        tracing::trace!(count = records.len(), "Updated queue snapshot");
        Ok(records)
    }
}
