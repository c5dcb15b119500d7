//! TTL key/value cache used in front of rate-limited providers.

use std::time::{Duration, Instant};

use log::{debug, warn};
use moka::sync::Cache;
use moka::Expiry;
use serde_json::Value;

/// Upper bound on entries held by [`MemoryCache::new`].
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Time-bounded key/value store owned by the host.
///
/// Expiry is the store's job; callers never see an expired entry.
pub trait CacheStore: Send + Sync {
    /// Live value under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Insert or overwrite `key`, expiring after `ttl`.
    fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Remove `key`. Returns whether an entry was present.
    fn delete(&self, key: &str) -> bool;

    /// Remove every key starting with `prefix`. Returns the number removed.
    fn delete_prefix(&self, prefix: &str) -> usize;
}

#[derive(Clone)]
struct Entry {
    value: Value,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process [`CacheStore`] backed by `moka`, bounded by entry count.
pub struct MemoryCache {
    entries: Cache<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Number of live entries, after pending expirations are applied.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value)
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.entries.insert(key.to_string(), Entry { value, ttl });
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn delete_prefix(&self, prefix: &str) -> usize {
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        let owned = prefix.to_string();
        if let Err(e) = self
            .entries
            .invalidate_entries_if(move |key, _| key.starts_with(&owned))
        {
            warn!("Cache predicate rejected ({:?}), removing keys one by one", e);
            for key in &matching {
                self.entries.invalidate(key);
            }
        }

        debug!("Dropped {} cache entries under '{}'", matching.len(), prefix);
        matching.len()
    }
}
