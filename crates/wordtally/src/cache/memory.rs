use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;

use crate::cache::{CacheEntry, CacheStore};
use crate::error::CacheError;

const MAX_ENTRIES: u64 = 1_024;

#[derive(Clone)]
struct Stored {
    entry: CacheEntry,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, Stored> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Stored, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache. Each entry expires after the ttl it was put with.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Cache<String, Stored>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self
            .inner
            .get(key)
            .map(|stored| stored.entry)
            .filter(|entry| !entry.is_expired()))
    }

    fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, value, ttl);
        self.inner.insert(key.to_string(), Stored { entry, ttl });
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key);
        Ok(())
    }
}
