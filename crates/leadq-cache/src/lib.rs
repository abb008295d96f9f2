//! LeadQ Cache - Local queue persistence
//!
//! SQLite-based storage for:
//! - The queue of records awaiting delivery
//! - The per-device identifier
//!
//! ## Architecture
//!
//! This crate implements the `IQueueStore` and `IDeviceIdentity` ports from
//! `leadq-core` using SQLite as the storage backend. It is a driven
//! (secondary) adapter in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteQueueStore`] - `IQueueStore` implementation
//! - [`SqliteDeviceIdentity`] - `IDeviceIdentity` implementation
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use leadq_cache::{DatabasePool, SqliteQueueStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/leadq/leadq.db")).await?;
//! let store = SqliteQueueStore::new(pool.pool().clone());
//! // Use store as IQueueStore...
//! # Ok(())
//! # }
//! ```

pub mod device_identity;
pub mod pool;
pub mod queue_store;

pub use device_identity::SqliteDeviceIdentity;
pub use pool::DatabasePool;
pub use queue_store::SqliteQueueStore;

/// Storage key of the serialized queue
pub const QUEUE_KEY: &str = "pendingLeads";

/// Storage key of the device identifier
pub const DEVICE_ID_KEY: &str = "deviceId";

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization of domain types failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Persisted data exists but cannot be decoded
    #[error("Corrupt data under key '{key}': {reason}")]
    CorruptData { key: String, reason: String },
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
