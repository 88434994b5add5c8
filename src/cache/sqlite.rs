//! SQLite-based cache store.
//!
//! Persistent key-value store with JSON values, stored in
//! `~/.recordmodel/cache.db` unless a path is given.
//!
//! # Design
//!
//! - No TTL - entries persist until removed or cleared
//! - Versioned - auto-clears on version mismatch

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{CacheError, CacheResult, CacheStore};

/// Current cache schema version. Bump this when the cache format changes.
const CACHE_VERSION: i32 = 1;

/// SQLite-backed [`CacheStore`].
pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
}

impl SqliteCacheStore {
    /// Open or create the cache database at the default location.
    pub fn open() -> CacheResult<Self> {
        Self::open_at(Self::cache_path()?)
    }

    /// Open or create the cache database at `path`.
    ///
    /// If the cache version doesn't match, it's automatically cleared.
    pub fn open_at(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory cache (for testing).
    pub fn open_in_memory() -> CacheResult<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init()?;
        Ok(store)
    }

    /// Get the default path to the cache database.
    pub fn cache_path() -> CacheResult<PathBuf> {
        let base = dirs::home_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(base.join(".recordmodel").join("cache.db"))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn init(&self) -> CacheResult<()> {
        let conn = self.conn();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS cache (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        if stored_version != Some(CACHE_VERSION) {
            if stored_version.is_some() {
                conn.execute("DELETE FROM cache", [])?;
            }
            conn.execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
                params![CACHE_VERSION.to_string()],
            )?;
        }

        Ok(())
    }

    fn get_value(&self, namespace: &str, key: &str) -> CacheResult<Option<Value>> {
        let json: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM cache WHERE namespace = ? AND key = ?",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn set_value(&self, namespace: &str, key: &str, value: &Value) -> CacheResult<()> {
        let json = serde_json::to_string(value)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO cache (namespace, key, value) VALUES (?, ?, ?)",
            params![namespace, key, json],
        )?;
        Ok(())
    }

    fn remove_value(&self, namespace: &str, key: &str) -> CacheResult<bool> {
        let rows = self.conn().execute(
            "DELETE FROM cache WHERE namespace = ? AND key = ?",
            params![namespace, key],
        )?;
        Ok(rows > 0)
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, namespace: &str, key: &str) -> CacheResult<Option<Value>> {
        self.get_value(namespace, key)
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> CacheResult<()> {
        self.set_value(namespace, key, &value)
    }

    async fn remove(&self, namespace: &str, key: &str) -> CacheResult<bool> {
        self.remove_value(namespace, key)
    }
}
