//! SQLite implementation of IDeviceIdentity
//!
//! The identifier is created once and stored under the `deviceId` key.
//! Creation uses `INSERT ... DO NOTHING` followed by a read, so two
//! processes racing on first start still agree on one id.

use chrono::Utc;
use sqlx::SqlitePool;

use leadq_core::domain::DeviceId;
use leadq_core::ports::IDeviceIdentity;

use crate::{CacheError, DEVICE_ID_KEY};

/// SQLite-backed per-device identifier
#[derive(Clone)]
pub struct SqliteDeviceIdentity {
    pool: SqlitePool,
}

impl SqliteDeviceIdentity {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn read(&self) -> Result<Option<DeviceId>, CacheError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(DEVICE_ID_KEY)
            .fetch_optional(&self.pool)
            .await?;

        value
            .map(|raw| {
                DeviceId::new(raw).map_err(|e| CacheError::CorruptData {
                    key: DEVICE_ID_KEY.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

#[async_trait::async_trait]
impl IDeviceIdentity for SqliteDeviceIdentity {
    async fn device_id(&self) -> anyhow::Result<DeviceId> {
        if let Some(id) = self.read().await? {
            return Ok(id);
        }

        let candidate = DeviceId::generate();
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO NOTHING",
        )
        .bind(DEVICE_ID_KEY)
        .bind(candidate.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(CacheError::from)?;

        let id = self.read().await?.ok_or_else(|| {
            CacheError::QueryFailed("device id missing right after insert".to_string())
        })?;

        tracing::info!(device_id = %id, "Device identifier created");
        Ok(id)
    }
}
