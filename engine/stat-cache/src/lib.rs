//! Time-bounded cache for shared cross-player aggregates
//!
//! League averages, position baselines, and opponent aggregates are
//! expensive to recompute and change slowly. Callers own one of these
//! caches and pass resolved values into the projection engine, which
//! itself stays stateless.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Hit/miss/eviction counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Thread-safe TTL cache with a bounded entry count. When full, the
/// oldest entry is evicted to make room.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    stats: RwLock<CacheStats>,
    max_entries: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
            max_entries: max_entries.max(1),
        }
    }

    /// Fetch a live value. Expired entries count as misses and are
    /// removed on access.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Utc::now();
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    self.stats.write().hits += 1;
                    return Some(entry.value.clone());
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.entries.write().remove(key);
        }
        self.stats.write().misses += 1;
        None
    }

    /// Insert a value with a time-to-live. Evicts the oldest entry when
    /// the cache is at capacity and the key is new.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let now = Utc::now();
        let mut entries = self.entries.write();
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            // Reclaim a dead entry before displacing a live one.
            let victim = entries
                .iter()
                .find(|(_, e)| e.expires_at <= now)
                .map(|(k, _)| (k.clone(), false))
                .or_else(|| {
                    entries
                        .iter()
                        .min_by_key(|(_, e)| e.inserted_at)
                        .map(|(k, _)| (k.clone(), true))
                });
            if let Some((victim_key, live)) = victim {
                entries.remove(&victim_key);
                if live {
                    self.stats.write().evictions += 1;
                    debug!("evicted oldest live entry at capacity");
                }
            }
        }
        entries.insert(key, Entry { value, inserted_at: now, expires_at: now + ttl });
    }

    /// Remove one key.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn clear_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_live_values_and_counts_hits() {
        let cache: TtlCache<String, f64> = TtlCache::new(16);
        cache.set("league_avg".to_string(), 212.5, Duration::minutes(10));
        assert_eq!(cache.get(&"league_avg".to_string()), Some(212.5));
        assert_eq!(cache.get(&"missing".to_string()), None);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache: TtlCache<&str, u32> = TtlCache::new(16);
        cache.set("stale", 7, Duration::milliseconds(-1));
        assert_eq!(cache.get(&"stale"), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn capacity_evicts_oldest_entry() {
        let cache: TtlCache<u32, u32> = TtlCache::new(2);
        cache.set(1, 10, Duration::minutes(5));
        cache.set(2, 20, Duration::minutes(5));
        cache.set(3, 30, Duration::minutes(5));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&3), Some(30));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn capacity_reclaims_expired_entries_before_live_ones() {
        let cache: TtlCache<u32, u32> = TtlCache::new(2);
        cache.set(1, 10, Duration::minutes(5));
        cache.set(2, 20, Duration::milliseconds(-1));
        cache.set(3, 30, Duration::minutes(5));
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.get(&3), Some(30));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn overwriting_existing_key_does_not_evict() {
        let cache: TtlCache<u32, u32> = TtlCache::new(2);
        cache.set(1, 10, Duration::minutes(5));
        cache.set(2, 20, Duration::minutes(5));
        cache.set(1, 11, Duration::minutes(5));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), Some(11));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn clear_expired_retains_live_entries() {
        let cache: TtlCache<&str, u32> = TtlCache::new(16);
        cache.set("live", 1, Duration::minutes(5));
        cache.set("dead", 2, Duration::milliseconds(-1));
        assert_eq!(cache.clear_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.invalidate(&"live"));
        assert!(cache.is_empty());
    }
}
