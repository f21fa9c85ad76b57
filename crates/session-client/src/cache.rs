//! Generic TTL cache for expensive read aggregates
//!
//! Keyed cache with one fixed TTL per cache and absolute per-entry expiry.
//! Expired entries are logically absent and evicted lazily by the access
//! that finds them; there is no background sweeper and no size bound.
//! Synchronous and non-suspending, safe to call from async code.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed cache with per-entry absolute expiry.
///
/// A TTL of zero disables the cache entirely: `get` always misses and
/// `set` never stores, so callers can wire caching through configuration
/// without branching at every call site.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the cache stores anything at all.
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Cached value iff present and unexpired; evicts the stale entry it
    /// finds on a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if Instant::now() <= entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store with expiry `now + ttl`, overwriting unconditionally.
    pub fn set(&self, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }
        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key, entry);
    }

    /// Explicit removal, for callers that know a mutation made the cached
    /// aggregate stale before its TTL elapsed.
    pub fn invalidate(&self, key: &K) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .remove(key);
    }

    /// Count of live entries; sweeps expired ones as a side effect.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.retain(|_, entry| now <= entry.expires_at);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_within_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set("user:1".into(), 42);
        assert_eq!(cache.get(&"user:1".into()), Some(42));
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(&"absent".into()), None);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(25));
        cache.set("k", 1);
        assert_eq!(cache.get(&"k"), Some(1), "visible before expiry");

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"k"), None, "absent after expiry");

        // Expired entry was evicted, a fresh set repopulates
        cache.set("k", 2);
        assert_eq!(cache.get(&"k"), Some(2));
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(10));
        cache.set("k", 1);
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get(&"k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn zero_ttl_disables_cache() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::ZERO);
        assert!(!cache.is_enabled());

        cache.set("k", 1);
        assert_eq!(cache.get(&"k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set("k", 1);
        cache.set("k", 2);
        assert_eq!(cache.get(&"k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_removes_live_entry() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set("k", 1);
        cache.invalidate(&"k");
        assert_eq!(cache.get(&"k"), None);
    }

    #[test]
    fn len_sweeps_expired_entries() {
        let cache: TtlCache<u32, &str> = TtlCache::new(Duration::from_millis(10));
        cache.set(1, "a");
        cache.set(2, "b");
        assert_eq!(cache.len(), 2);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.len(), 0);
    }
}
