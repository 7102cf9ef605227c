//! In-memory response cache with expiration, LRU eviction and persistence
//!
//! Lookups and inserts are synchronous and never fail from the caller's point
//! of view: storage trouble is logged and the cache carries on in memory.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::flush::DebouncedFlush;
use super::storage::{DurableStorage, StorageError};
use super::{CacheCategory, CacheEntry, RequestKey};
use crate::config::CacheConfig;

/// Storage key holding the serialized entry list
pub const CACHE_STORAGE_KEY: &str = "weatherCache";

/// Errors reported by an explicit flush
#[derive(Debug, Error)]
pub enum CacheError {
    /// Storage refused the write; the oldest half of the entries was dropped
    #[error("Storage quota exceeded, evicted {evicted} oldest entries")]
    QuotaExceeded { evicted: usize },

    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to persist cache: {0}")]
    Storage(StorageError),
}

/// Entry counts at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub capacity: usize,
    pub entries: usize,
    pub fresh: usize,
    pub by_category: Vec<(CacheCategory, usize)>,
}

impl CacheStats {
    pub fn stale(&self) -> usize {
        self.entries - self.fresh
    }
}

struct Shared {
    /// Front (least recently used) is evicted first
    entries: Mutex<LruCache<String, CacheEntry>>,
    storage: Arc<dyn DurableStorage>,
    config: CacheConfig,
    flush: DebouncedFlush,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn flush(&self) -> Result<usize, CacheError> {
        let (json, count) = {
            let entries = self.lock();
            // Least recently used first, so reloading restores the same order
            let list: Vec<(&String, &CacheEntry)> = entries.iter().rev().collect();
            (serde_json::to_string(&list)?, list.len())
        };

        match self.storage.write_string(CACHE_STORAGE_KEY, &json) {
            Ok(()) => {
                debug!(entries = count, bytes = json.len(), "Persisted response cache");
                Ok(count)
            }
            Err(StorageError::QuotaExceeded { needed, quota }) => {
                let evicted = self.evict_oldest_half();
                warn!(needed, quota, evicted, "Storage quota exceeded, dropped oldest cache entries");
                Err(CacheError::QuotaExceeded { evicted })
            }
            Err(e) => Err(CacheError::Storage(e)),
        }
    }

    fn flush_logged(&self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "Failed to persist response cache");
        }
    }

    /// Drops the older half (rounded down) of the entries by write time
    fn evict_oldest_half(&self) -> usize {
        let mut entries = self.lock();
        let mut by_age: Vec<(DateTime<Utc>, String)> = entries
            .iter()
            .map(|(key, entry)| (entry.stored_at, key.clone()))
            .collect();
        by_age.sort();

        let count = by_age.len() / 2;
        for (_, key) in by_age.into_iter().take(count) {
            entries.pop(&key);
        }
        count
    }
}

/// Handle to the process-wide response cache
///
/// Cloning is cheap and every clone sees the same entries. Construct one at
/// startup with [`ResponseCache::load`] and hand clones to whatever issues
/// requests.
#[derive(Clone)]
pub struct ResponseCache {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl ResponseCache {
    /// Creates an empty cache without touching storage
    pub fn new(config: CacheConfig, storage: Arc<dyn DurableStorage>) -> Self {
        let capacity = config.max_entries_non_zero();
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(LruCache::new(capacity)),
                storage,
                config,
                flush: DebouncedFlush::new(),
            }),
        }
    }

    /// Creates a cache and fills it with the still-fresh persisted entries
    pub fn load(config: CacheConfig, storage: Arc<dyn DurableStorage>) -> Self {
        let cache = Self::new(config, storage);
        cache.load_from_storage();
        cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Returns the cached payload for `key` if it is still fresh
    pub fn get(&self, key: &RequestKey) -> Option<Value> {
        self.get_at(key, Utc::now())
    }

    /// Like [`get`](Self::get), evaluated at `now`
    ///
    /// Freshness is judged by the category stored with the entry, so an entry
    /// expires on the same schedule whether it was just written or reloaded.
    /// A fresh hit becomes the most recently used entry. An expired entry is
    /// removed.
    pub fn get_at(&self, key: &RequestKey, now: DateTime<Utc>) -> Option<Value> {
        let mut entries = self.shared.lock();

        let (fresh, age, category) = match entries.peek(key.key()) {
            Some(entry) => (entry.is_fresh(now), entry.age(now), entry.category),
            None => {
                debug!(key = key.key(), "Cache miss");
                return None;
            }
        };

        if fresh {
            debug!(%category, age_secs = age.num_seconds(), "Using cached response");
            entries.get(key.key()).map(|entry| entry.payload.clone())
        } else {
            entries.pop(key.key());
            debug!(key = key.key(), age_secs = age.num_seconds(), "Cache entry expired");
            None
        }
    }

    /// Stores `payload` under `key` and schedules a debounced flush
    pub fn put(&self, key: &RequestKey, payload: Value) {
        self.put_at(key, payload, Utc::now());
    }

    /// Like [`put`](Self::put), stamped with `now`
    ///
    /// Overwriting refreshes both recency and write time. A new key arriving
    /// at capacity evicts the least recently used entry.
    pub fn put_at(&self, key: &RequestKey, payload: Value, now: DateTime<Utc>) {
        let entry = CacheEntry::new(key.url(), payload, key.category(), now);
        {
            let mut entries = self.shared.lock();
            if let Some((evicted, _)) = entries.push(key.key().to_string(), entry) {
                if evicted != key.key() {
                    debug!(evicted = %evicted, "Cache full, evicted least recently used entry");
                }
            }
        }
        self.schedule_flush();
    }

    /// Removes every entry whose key or original URL starts with one of `prefixes`
    ///
    /// Persists immediately when anything was removed. Returns the number of
    /// entries removed.
    pub fn invalidate<S: AsRef<str>>(&self, prefixes: &[S]) -> usize {
        self.invalidate_where(|key, entry| {
            prefixes.iter().any(|prefix| {
                let prefix = prefix.as_ref();
                key.starts_with(prefix) || entry.url.starts_with(prefix)
            })
        })
    }

    /// Removes every entry matching `predicate`, persisting immediately
    ///
    /// The predicate runs against a snapshot taken outside the lock, so it may
    /// itself use the cache.
    pub fn invalidate_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&str, &CacheEntry) -> bool,
    {
        let snapshot: Vec<(String, CacheEntry)> = self
            .shared
            .lock()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();

        let doomed: Vec<(String, CacheEntry)> = snapshot
            .into_iter()
            .filter(|(key, entry)| predicate(key, entry))
            .collect();

        let mut removed = 0;
        {
            let mut entries = self.shared.lock();
            for (key, seen) in &doomed {
                // Skip entries rewritten since the snapshot
                let unchanged = entries
                    .peek(key)
                    .is_some_and(|current| current.stored_at == seen.stored_at);
                if unchanged {
                    entries.pop(key);
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!(removed, "Invalidated cache entries");
            self.shared.flush.cancel();
            self.shared.flush_logged();
        }
        removed
    }

    /// Empties the cache and persists the empty state
    pub fn clear(&self) -> usize {
        let removed = {
            let mut entries = self.shared.lock();
            let removed = entries.len();
            entries.clear();
            removed
        };
        self.shared.flush.cancel();
        self.shared.flush_logged();
        removed
    }

    /// Replaces the in-memory entries with the persisted ones
    pub fn load_from_storage(&self) -> usize {
        self.load_from_storage_at(Utc::now())
    }

    /// Like [`load_from_storage`](Self::load_from_storage), expiring against `now`
    ///
    /// Missing, unreadable or corrupt storage yields an empty cache.
    pub fn load_from_storage_at(&self, now: DateTime<Utc>) -> usize {
        let persisted = match self.shared.storage.read_string(CACHE_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<(String, CacheEntry)>>(&raw) {
                Ok(persisted) => persisted,
                Err(e) => {
                    warn!(error = %e, "Persisted response cache is corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted response cache, starting empty");
                Vec::new()
            }
        };

        let total = persisted.len();
        let policy = self.shared.config.key_policy;
        let mut entries = self.shared.lock();
        entries.clear();
        // Keys are re-derived so entries written under another policy stay reachable
        for (_, entry) in persisted {
            if entry.is_fresh(now) {
                entries.push(policy.canonicalize(&entry.url), entry);
            }
        }

        let loaded = entries.len();
        if total > 0 {
            info!(loaded, skipped = total - loaded, "Loaded response cache from storage");
        }
        loaded
    }

    /// Writes all entries to storage now, cancelling any pending debounced flush
    ///
    /// On a quota failure the oldest half of the entries is evicted and the
    /// write is not retried; call again to persist the smaller cache.
    pub fn flush(&self) -> Result<usize, CacheError> {
        self.shared.flush.cancel();
        self.shared.flush()
    }

    /// Whether a debounced flush is waiting to run
    pub fn flush_pending(&self) -> bool {
        self.shared.flush.is_pending()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.lock().cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> CacheStats {
        let entries = self.shared.lock();
        let by_category = CacheCategory::ALL
            .iter()
            .map(|&category| {
                let count = entries.iter().filter(|(_, e)| e.category == category).count();
                (category, count)
            })
            .collect();

        CacheStats {
            capacity: entries.cap().get(),
            entries: entries.len(),
            fresh: entries.iter().filter(|(_, e)| e.is_fresh(now)).count(),
            by_category,
        }
    }

    fn schedule_flush(&self) {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let scheduled = self.shared.flush.schedule(self.shared.config.flush_debounce(), move || {
            if let Some(shared) = weak.upgrade() {
                shared.flush_logged();
            }
        });

        if !scheduled {
            self.shared.flush_logged();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::storage::MemoryStorage;
    use crate::cache::KeyPolicy;
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Storage that counts writes
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        writes: AtomicUsize,
    }

    impl DurableStorage for CountingStorage {
        fn read_string(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.read_string(key)
        }

        fn write_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.write_string(key, value)
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    fn cache_with_capacity(max_entries: usize) -> (ResponseCache, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let config = CacheConfig {
            max_entries,
            ..Default::default()
        };
        (ResponseCache::new(config, storage.clone()), storage)
    }

    fn weather_key(name: &str) -> RequestKey {
        RequestKey::new(
            CacheCategory::Weather,
            format!("https://api.open-meteo.com/v1/forecast?name={}", name),
            KeyPolicy::FullUrl,
        )
    }

    #[test]
    fn test_miss_on_empty_cache() {
        let (cache, _) = cache_with_capacity(10);
        assert!(cache.get_at(&weather_key("a"), t0()).is_none());
    }

    #[test]
    fn test_hit_within_window() {
        let (cache, _) = cache_with_capacity(10);
        let key = weather_key("a");
        cache.put_at(&key, json!({"temp": 5}), t0());

        let hit = cache.get_at(&key, t0() + Duration::minutes(4));
        assert_eq!(hit, Some(json!({"temp": 5})));
    }

    #[test]
    fn test_expired_entry_is_removed() {
        let (cache, _) = cache_with_capacity(10);
        let key = weather_key("a");
        cache.put_at(&key, json!(1), t0());

        assert!(cache.get_at(&key, t0() + Duration::minutes(5)).is_none());
        assert_eq!(cache.len(), 0);
        // Going back in time does not resurrect it
        assert!(cache.get_at(&key, t0()).is_none());
    }

    #[test]
    fn test_overwrite_refreshes_stored_at() {
        let (cache, _) = cache_with_capacity(10);
        let key = weather_key("a");
        cache.put_at(&key, json!(1), t0());
        cache.put_at(&key, json!(2), t0() + Duration::minutes(4));

        let hit = cache.get_at(&key, t0() + Duration::minutes(8));
        assert_eq!(hit, Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_persists_without_runtime() {
        let (cache, storage) = cache_with_capacity(10);
        cache.put_at(&weather_key("a"), json!(1), t0());

        let raw = storage.read_string(CACHE_STORAGE_KEY).unwrap().expect("Should be persisted");
        let list: Vec<(String, CacheEntry)> = serde_json::from_str(&raw).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].1.payload, json!(1));
    }

    #[test]
    fn test_persisted_order_is_least_recent_first() {
        let (cache, storage) = cache_with_capacity(10);
        let (a, b) = (weather_key("a"), weather_key("b"));
        cache.put_at(&a, json!("a"), t0());
        cache.put_at(&b, json!("b"), t0());
        cache.get_at(&a, t0());
        cache.flush().unwrap();

        let raw = storage.read_string(CACHE_STORAGE_KEY).unwrap().unwrap();
        let list: Vec<(String, CacheEntry)> = serde_json::from_str(&raw).unwrap();
        let keys: Vec<&str> = list.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec![b.key(), a.key()]);
    }

    #[test]
    fn test_load_skips_expired_entries() {
        let (cache, storage) = cache_with_capacity(10);
        let weather = weather_key("a");
        let geo = RequestKey::new(
            CacheCategory::Geocoding,
            "https://geocoding-api.open-meteo.com/v1/search?name=Oslo",
            KeyPolicy::FullUrl,
        );
        cache.put_at(&weather, json!(1), t0());
        cache.put_at(&geo, json!(2), t0());

        let reloaded = ResponseCache::new(CacheConfig::default(), storage);
        let loaded = reloaded.load_from_storage_at(t0() + Duration::hours(1));

        assert_eq!(loaded, 1);
        assert!(reloaded.get_at(&weather, t0() + Duration::hours(1)).is_none());
        assert_eq!(reloaded.get_at(&geo, t0() + Duration::hours(1)), Some(json!(2)));
    }

    #[test]
    fn test_load_corrupt_storage_is_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write_string(CACHE_STORAGE_KEY, "{not json").unwrap();

        let cache = ResponseCache::new(CacheConfig::default(), storage);
        assert_eq!(cache.load_from_storage_at(t0()), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_missing_storage_is_empty() {
        let cache = ResponseCache::load(CacheConfig::default(), Arc::new(MemoryStorage::new()));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_more_than_capacity_keeps_most_recent() {
        let (big, storage) = cache_with_capacity(10);
        for i in 0..10 {
            big.put_at(&weather_key(&i.to_string()), json!(i), t0());
        }

        let small = ResponseCache::new(
            CacheConfig {
                max_entries: 3,
                ..Default::default()
            },
            storage,
        );
        assert_eq!(small.load_from_storage_at(t0()), 3);
        assert!(small.get_at(&weather_key("9"), t0()).is_some());
        assert!(small.get_at(&weather_key("0"), t0()).is_none());
    }

    #[test]
    fn test_invalidate_matches_original_url_prefix() {
        let (cache, _) = cache_with_capacity(10);
        let here = RequestKey::new(
            CacheCategory::Weather,
            "https://api.open-meteo.com/v1/forecast?latitude=1&longitude=2&current=x",
            KeyPolicy::PathOnly,
        );
        let other = RequestKey::new(
            CacheCategory::Geocoding,
            "https://geocoding-api.open-meteo.com/v1/search?name=Oslo",
            KeyPolicy::PathOnly,
        );
        cache.put_at(&here, json!(1), t0());
        cache.put_at(&other, json!(2), t0());

        let removed = cache.invalidate(&["https://api.open-meteo.com/v1/forecast?latitude=1&longitude=2"]);

        assert_eq!(removed, 1);
        assert!(cache.get_at(&here, t0()).is_none());
        assert!(cache.get_at(&other, t0()).is_some());
    }

    #[test]
    fn test_invalidate_nothing_matches() {
        let (cache, _) = cache_with_capacity(10);
        cache.put_at(&weather_key("a"), json!(1), t0());
        assert_eq!(cache.invalidate(&["https://nowhere"]), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_where_by_category() {
        let (cache, _) = cache_with_capacity(10);
        cache.put_at(&weather_key("a"), json!(1), t0());
        cache.put_at(&weather_key("b"), json!(2), t0());
        let removed = cache.invalidate_where(|_, entry| entry.category == CacheCategory::Weather);
        assert_eq!(removed, 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_where_predicate_may_use_cache() {
        let (cache, _) = cache_with_capacity(10);
        cache.put_at(&weather_key("a"), json!(1), t0());
        cache.put_at(&weather_key("b"), json!(2), t0());

        let removed = cache.invalidate_where(|key, _| cache.len() == 2 && key.ends_with("name=a"));

        assert_eq!(removed, 1);
        assert!(cache.get_at(&weather_key("b"), t0()).is_some());
    }

    #[test]
    fn test_expiry_follows_stored_category() {
        let (cache, _) = cache_with_capacity(10);
        let url = "https://geocoding-api.open-meteo.com/v1/search?name=Os&count=5";
        let suggestion = RequestKey::new(CacheCategory::Suggestions, url, KeyPolicy::PathOnly);
        let lookup = RequestKey::new(CacheCategory::Geocoding, url, KeyPolicy::PathOnly);

        cache.put_at(&suggestion, json!([]), t0());

        // Stored as a suggestion, so it lives one hour even when read as geocoding
        assert!(cache.get_at(&lookup, t0() + Duration::minutes(59)).is_some());
        assert!(cache.get_at(&lookup, t0() + Duration::hours(2)).is_none());
    }

    #[test]
    fn test_load_rekeys_entries_under_current_policy() {
        let storage = Arc::new(MemoryStorage::new());
        let url = "https://api.open-meteo.com/v1/forecast?longitude=2&latitude=1";
        let path_only = CacheConfig {
            key_policy: KeyPolicy::PathOnly,
            ..Default::default()
        };
        let writer = ResponseCache::new(path_only, storage.clone());
        writer.put_at(&RequestKey::new(CacheCategory::Weather, url, KeyPolicy::PathOnly), json!(1), t0());
        writer.flush().unwrap();

        let reader = ResponseCache::new(CacheConfig::default(), storage);
        assert_eq!(reader.load_from_storage_at(t0()), 1);

        let key = RequestKey::new(CacheCategory::Weather, url, KeyPolicy::FullUrl);
        assert_eq!(reader.get_at(&key, t0()), Some(json!(1)));
    }

    #[test]
    fn test_quota_failure_evicts_oldest_half() {
        let storage = Arc::new(MemoryStorage::with_quota(0));
        let cache = ResponseCache::new(CacheConfig::default(), storage);

        // Each put's own flush fails and trims, so track survivors instead
        for i in 0..4 {
            cache.put_at(&weather_key(&i.to_string()), json!(i), t0() + Duration::seconds(i));
        }
        assert!(cache.len() < 4);

        let before = cache.len();
        match cache.flush() {
            Err(CacheError::QuotaExceeded { evicted }) => assert_eq!(evicted, before / 2),
            other => panic!("Expected quota error, got {:?}", other),
        }
        // Newest entry survives every trim
        assert!(cache.get_at(&weather_key("3"), t0() + Duration::seconds(3)).is_some());
    }

    #[test]
    fn test_clear_empties_and_persists() {
        let (cache, storage) = cache_with_capacity(10);
        cache.put_at(&weather_key("a"), json!(1), t0());
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
        assert_eq!(storage.read_string(CACHE_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_stats_counts_fresh_and_categories() {
        let (cache, _) = cache_with_capacity(10);
        cache.put_at(&weather_key("a"), json!(1), t0());
        cache.put_at(
            &RequestKey::classify("https://geocoding-api.open-meteo.com/v1/search?name=x", KeyPolicy::FullUrl),
            json!(2),
            t0(),
        );

        let stats = cache.stats_at(t0() + Duration::minutes(10));
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.fresh, 1);
        assert_eq!(stats.stale(), 1);
        assert!(stats.by_category.contains(&(CacheCategory::Weather, 1)));
        assert!(stats.by_category.contains(&(CacheCategory::Geocoding, 1)));
        assert!(stats.by_category.contains(&(CacheCategory::Suggestions, 0)));
    }

    #[tokio::test]
    async fn test_burst_of_puts_flushes_once() {
        let storage = Arc::new(CountingStorage::default());
        let config = CacheConfig {
            flush_debounce_ms: 30,
            ..Default::default()
        };
        let cache = ResponseCache::new(config, storage.clone());

        for i in 0..5 {
            cache.put(&weather_key(&i.to_string()), json!(i));
        }
        assert!(cache.flush_pending());
        assert_eq!(storage.writes.load(Ordering::SeqCst), 0);

        tokio::time::sleep(std::time::Duration::from_millis(150)).await;

        assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
        let raw = storage.read_string(CACHE_STORAGE_KEY).unwrap().unwrap();
        let list: Vec<(String, CacheEntry)> = serde_json::from_str(&raw).unwrap();
        assert_eq!(list.len(), 5);
    }

    #[tokio::test]
    async fn test_invalidate_flushes_immediately() {
        let storage = Arc::new(CountingStorage::default());
        let config = CacheConfig {
            flush_debounce_ms: 10_000,
            ..Default::default()
        };
        let cache = ResponseCache::new(config, storage.clone());
        let key = weather_key("a");
        cache.put(&key, json!(1));
        cache.put(&weather_key("b"), json!(2));

        cache.invalidate(&[key.key()]);

        assert_eq!(storage.writes.load(Ordering::SeqCst), 1);
        assert!(!cache.flush_pending(), "Immediate flush supersedes the debounced one");
        let raw = storage.read_string(CACHE_STORAGE_KEY).unwrap().unwrap();
        let list: Vec<(String, CacheEntry)> = serde_json::from_str(&raw).unwrap();
        assert_eq!(list.len(), 1);
    }
}
