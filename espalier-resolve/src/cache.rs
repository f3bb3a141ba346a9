//! The batch cache: fetched entities held per type and key.
//!
//! This module provides:
//! - [`BatchCache`], a concurrency-safe `entity type -> key -> record` map
//! - Hit/miss statistics via [`CacheStats`]
//! - The process-wide shared instance behind [`BatchCache::shared`]
//!
//! A transient cache lives for one build pass; the shared cache lives until
//! explicitly flushed, amortizing repeated reference fetches across many
//! independent validations. There is no invalidation feed from the backing
//! store, so the shared variant trades staleness for fetch count.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use espalier_resolve::{BatchCache, Key, Record};
//!
//! let cache = BatchCache::new();
//! cache.put("User", Key::Int(5), Arc::new(Record::new("User", 5)));
//!
//! assert_eq!(cache.len(), 1);
//! assert!(cache.get_one("User", &Key::Int(5)).is_some());
//! assert_eq!(cache.stats().hits, 1);
//!
//! cache.flush("User");
//! assert!(cache.is_empty());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use smol_str::SmolStr;

use crate::record::{Key, Record};

/// Process-wide shared cache instance.
static SHARED_CACHE: LazyLock<Arc<BatchCache>> = LazyLock::new(|| Arc::new(BatchCache::new()));

// ============================================================================
// Batch Cache
// ============================================================================

/// Fetched entities, keyed by entity type and primary key.
///
/// All structural mutation goes through one lock; reads are served from
/// snapshots taken under the same lock. No lock is held across store calls.
#[derive(Default)]
pub struct BatchCache {
    entries: RwLock<HashMap<SmolStr, HashMap<Key, Arc<Record>>>>,
    stats: RwLock<CacheStats>,
}

/// Statistics for a batch cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of records currently cached.
    pub cached_count: usize,
}

impl CacheStats {
    /// Get the cache hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl BatchCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide shared instance.
    ///
    /// Created on first use; entries persist until flushed explicitly.
    pub fn shared() -> Arc<BatchCache> {
        Arc::clone(&SHARED_CACHE)
    }

    /// Snapshot of all cached records for one entity type.
    ///
    /// Empty if the type has no entries. The snapshot is decoupled from the
    /// cache: later writes do not alter it.
    pub fn entries(&self, entity: &str) -> HashMap<Key, Arc<Record>> {
        self.entries
            .read()
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    /// Look up one record, counting a hit or a miss.
    pub fn get_one(&self, entity: &str, key: &Key) -> Option<Arc<Record>> {
        let found = {
            let entries = self.entries.read();
            entries.get(entity).and_then(|records| records.get(key)).cloned()
        };
        let mut stats = self.stats.write();
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    /// Whether a record is cached.
    pub fn contains(&self, entity: &str, key: &Key) -> bool {
        self.entries
            .read()
            .get(entity)
            .is_some_and(|records| records.contains_key(key))
    }

    /// Store one record.
    pub fn put(&self, entity: impl Into<SmolStr>, key: Key, record: Arc<Record>) {
        let mut entries = self.entries.write();
        entries.entry(entity.into()).or_default().insert(key, record);
    }

    /// Store a batch of records for one entity type.
    pub fn put_many(
        &self,
        entity: impl Into<SmolStr>,
        records: impl IntoIterator<Item = (Key, Arc<Record>)>,
    ) {
        let mut entries = self.entries.write();
        let slot = entries.entry(entity.into()).or_default();
        for (key, record) in records {
            slot.insert(key, record);
        }
    }

    /// Drop every entry for one entity type. No-op for unknown names.
    pub fn flush(&self, entity: &str) {
        self.entries.write().remove(entity);
    }

    /// Drop every entry.
    pub fn flush_all(&self) {
        self.entries.write().clear();
    }

    /// Total number of cached records across all types.
    pub fn len(&self) -> usize {
        self.entries.read().values().map(|records| records.len()).sum()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().clone();
        stats.cached_count = self.len();
        stats
    }

    /// Account for hits observed outside `get_one` (batched lookups).
    pub(crate) fn note_hits(&self, count: u64) {
        self.stats.write().hits += count;
    }

    /// Account for misses observed outside `get_one` (batched lookups).
    pub(crate) fn note_misses(&self, count: u64) {
        self.stats.write().misses += count;
    }
}

impl std::fmt::Debug for BatchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.read();
        f.debug_struct("BatchCache")
            .field("types", &entries.len())
            .field("records", &entries.values().map(|r| r.len()).sum::<usize>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity: &str, key: i64) -> Arc<Record> {
        Arc::new(Record::new(entity, key).with_field("id", key))
    }

    #[test]
    fn test_put_and_get() {
        let cache = BatchCache::new();
        cache.put("User", Key::Int(5), record("User", 5));

        let hit = cache.get_one("User", &Key::Int(5)).unwrap();
        assert_eq!(hit.key(), &Key::Int(5));
        assert!(cache.get_one("User", &Key::Int(6)).is_none());
        assert!(cache.get_one("Item", &Key::Int(5)).is_none());
    }

    #[test]
    fn test_entries_snapshot() {
        let cache = BatchCache::new();
        cache.put("User", Key::Int(1), record("User", 1));
        cache.put("User", Key::Int(2), record("User", 2));

        let snapshot = cache.entries("User");
        assert_eq!(snapshot.len(), 2);
        assert!(cache.entries("Item").is_empty());

        // Later writes do not alter the snapshot.
        cache.put("User", Key::Int(3), record("User", 3));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_put_many() {
        let cache = BatchCache::new();
        cache.put_many(
            "Item",
            [
                (Key::Int(1), record("Item", 1)),
                (Key::Int(2), record("Item", 2)),
            ],
        );

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("Item", &Key::Int(1)));
        assert!(cache.contains("Item", &Key::Int(2)));
    }

    #[test]
    fn test_hit_miss_stats() {
        let cache = BatchCache::new();
        cache.put("User", Key::Int(5), record("User", 5));

        let _ = cache.get_one("User", &Key::Int(5));
        let _ = cache.get_one("User", &Key::Int(5));
        let _ = cache.get_one("User", &Key::Int(9));

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.cached_count, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn test_stats_zero() {
        assert_eq!(BatchCache::new().stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_flush_by_type() {
        let cache = BatchCache::new();
        cache.put("User", Key::Int(1), record("User", 1));
        cache.put("Item", Key::Int(1), record("Item", 1));

        cache.flush("User");
        assert!(!cache.contains("User", &Key::Int(1)));
        assert!(cache.contains("Item", &Key::Int(1)));

        // Unknown names are a no-op.
        cache.flush("Ghost");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_flush_all() {
        let cache = BatchCache::new();
        cache.put("User", Key::Int(1), record("User", 1));
        cache.put("Item", Key::Int(1), record("Item", 1));

        cache.flush_all();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_overwrite_same_key() {
        let cache = BatchCache::new();
        cache.put("User", Key::Int(1), record("User", 1));
        let replacement = Arc::new(Record::new("User", 1).with_field("name", "ada"));
        cache.put("User", Key::Int(1), Arc::clone(&replacement));

        assert_eq!(cache.len(), 1);
        let fetched = cache.get_one("User", &Key::Int(1)).unwrap();
        assert!(Arc::ptr_eq(&fetched, &replacement));
    }

    #[test]
    fn test_string_keys() {
        let cache = BatchCache::new();
        cache.put(
            "Region",
            Key::from("us-east"),
            Arc::new(Record::new("Region", "us-east")),
        );
        assert!(cache.get_one("Region", &Key::from("us-east")).is_some());
    }

    #[test]
    fn test_shared_singleton() {
        let first = BatchCache::shared();
        let second = BatchCache::shared();
        assert!(Arc::ptr_eq(&first, &second));

        // Keep the shared instance clean for other tests.
        first.put("SharedCacheProbe", Key::Int(1), record("SharedCacheProbe", 1));
        assert!(second.contains("SharedCacheProbe", &Key::Int(1)));
        first.flush("SharedCacheProbe");
        assert!(!second.contains("SharedCacheProbe", &Key::Int(1)));
    }
}
