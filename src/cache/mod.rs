//! Cache store capability.
//!
//! A cache store maps a composite `(namespace, key)` to a JSON value.
//! Expiry and eviction belong to the store; callers only get and set.
//!
//! # Stores
//!
//! - [`MemoryCacheStore`] - process-local, concurrent map
//! - [`SqliteCacheStore`] - persistent, stored in `~/.recordmodel/cache.db`

mod memory;
mod sqlite;

pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

use async_trait::async_trait;
use serde_json::Value;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Get/set access to a namespaced key/value store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> CacheResult<Option<Value>>;

    async fn set(&self, namespace: &str, key: &str, value: Value) -> CacheResult<()>;

    /// Remove an entry. Returns true if one existed.
    async fn remove(&self, namespace: &str, key: &str) -> CacheResult<bool>;
}
