//! SQLite-backed cache that survives across process invocations.
//!
//! Uses rusqlite with a single connection behind a `Mutex`. Expired rows
//! are purged lazily on read.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::cache::{migrations, CacheEntry, CacheStore};
use crate::error::CacheError;

/// Cloning is cheap (inner `Arc`); clones share one connection.
#[derive(Clone)]
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCache {
    /// Opens (or creates) the cache database at `path` and runs pending
    /// migrations.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        migrations::run_all(&conn)?;

        info!("Cache opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(&Connection) -> Result<T, CacheError>,
    {
        let conn = self.conn.lock().map_err(|_| CacheError::LockPoisoned)?;
        f(&conn)
    }

    /// Deletes every expired row. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        self.with_conn(|conn| purge(conn, Utc::now()))
    }
}

fn purge(conn: &Connection, now: DateTime<Utc>) -> Result<usize, CacheError> {
    let removed = conn.execute(
        "DELETE FROM cache_entries WHERE expires_at <= ?1",
        params![now.timestamp_millis()],
    )?;
    if removed > 0 {
        debug!(removed, "Purged expired cache entries");
    }
    Ok(removed)
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        self.with_conn(|conn| {
            purge(conn, Utc::now())?;

            let row: Option<(String, i64)> = conn
                .query_row(
                    "SELECT value, expires_at FROM cache_entries WHERE key = ?1",
                    params![key],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
                .optional()?;

            let Some((raw, expires_at)) = row else {
                return Ok(None);
            };

            let entry = CacheEntry {
                key: key.to_string(),
                value: serde_json::from_str(&raw)?,
                expires_at: DateTime::from_timestamp_millis(expires_at)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            };

            Ok((!entry.is_expired()).then_some(entry))
        })
    }

    fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, value, ttl);
        let raw = serde_json::to_string(&entry.value)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
                params![entry.key, raw, entry.expires_at.timestamp_millis()],
            )?;
            Ok(())
        })
    }

    fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
            Ok(())
        })
    }
}
