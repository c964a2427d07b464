//! In-memory TTL cache for query results.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::cms::QueryParams;

/// Default bound on the number of cached queries.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Identity of a query: the GROQ text plus its canonical parameters.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(query: &str, params: &QueryParams) -> Self {
        // BTreeMap keys serialize in order, so equal params give equal keys
        let params = serde_json::to_string(params).unwrap_or_default();
        Self(format!("{}-{}", query, params))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-lifetime cache. Entries are never served at or past their expiry.
pub struct QueryCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    max_entries: usize,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl QueryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get a live entry. Expired entries are removed and reported as absent.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries();
        let entry = entries.get(key)?;
        if !entry.is_expired(now) {
            return Some(entry.value.clone());
        }
        entries.remove(key);
        debug!("Cache entry expired");
        None
    }

    pub fn insert(&self, key: CacheKey, value: Value, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries();

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| !entry.is_expired(now));
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                    debug!("Evicted oldest cache entry");
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                expires_at: now + ttl,
            },
        );
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
