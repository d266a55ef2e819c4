//! Expiring key/value storage for computed totals.

pub mod memory;
pub mod migrations;
pub mod sqlite;

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

/// Key of the structured-content aggregate.
pub const CONTENT_KEY: &str = "wordtally.content";
/// Key of the saved attachment total.
pub const ATTACHMENTS_KEY: &str = "wordtally.attachments";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: serde_json::Value, ttl: Duration) -> Self {
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            key: key.into(),
            value,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Entries are overwritten wholesale by `put`. An expired entry is never
/// returned by `get`.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<(), CacheError>;
    fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

/// Reads and deserializes the live value under `key`.
pub fn get_json<T: DeserializeOwned>(
    cache: &dyn CacheStore,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key)? {
        Some(entry) => Ok(Some(serde_json::from_value(entry.value)?)),
        None => Ok(None),
    }
}

pub fn put_json<T: Serialize>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError> {
    cache.put(key, serde_json::to_value(value)?, ttl)
}
