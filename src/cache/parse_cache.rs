//! LRU cache of parse results keyed by (path, content hash).

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::types::ParseResult;

/// Cache key. The hash makes entries content-addressed: an edit changes the
/// hash, so a lookup after an edit is a miss rather than a stale hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseKey {
    pub path: String,
    pub hash: String,
}

impl ParseKey {
    pub fn new(path: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hash: hash.into(),
        }
    }
}

/// Hit/miss counters, reported in the scan summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct ParseCache {
    entries: LruCache<ParseKey, ParseResult>,
    stats: CacheStats,
}

impl ParseCache {
    /// Capacity is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Look up a result, counting the hit or miss and refreshing recency.
    pub fn get(&mut self, key: &ParseKey) -> Option<ParseResult> {
        match self.entries.get(key) {
            Some(result) => {
                self.stats.hits += 1;
                Some(result.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a result, evicting the least recently used entry when full.
    pub fn set(&mut self, key: ParseKey, result: ParseResult) {
        self.entries.put(key, result);
    }

    /// Drop every entry for a path, regardless of hash.
    pub fn invalidate(&mut self, path: &str) -> usize {
        let stale: Vec<ParseKey> = self
            .entries
            .iter()
            .filter(|(k, _)| k.path == path)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            self.entries.pop(key);
        }
        stale.len()
    }

    /// Evict up to `n` entries, oldest first. Used under memory pressure.
    pub fn prune_oldest(&mut self, n: usize) -> usize {
        let mut evicted = 0;
        for _ in 0..n {
            if self.entries.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;

    fn result() -> ParseResult {
        ParseResult::empty(Language::Python)
    }

    #[test]
    fn test_hit_and_miss_counting() {
        let mut cache = ParseCache::new(4);
        let key = ParseKey::new("a.py", "h1");

        assert!(cache.get(&key).is_none());
        cache.set(key.clone(), result());
        assert!(cache.get(&key).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_changed_hash_misses() {
        let mut cache = ParseCache::new(4);
        cache.set(ParseKey::new("a.py", "h1"), result());
        assert!(cache.get(&ParseKey::new("a.py", "h2")).is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ParseCache::new(2);
        cache.set(ParseKey::new("a.py", "h"), result());
        cache.set(ParseKey::new("b.py", "h"), result());
        // Touch a so b becomes the LRU entry.
        cache.get(&ParseKey::new("a.py", "h"));
        cache.set(ParseKey::new("c.py", "h"), result());

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&ParseKey::new("a.py", "h")).is_some());
        assert!(cache.get(&ParseKey::new("b.py", "h")).is_none());
    }

    #[test]
    fn test_invalidate_by_path() {
        let mut cache = ParseCache::new(8);
        cache.set(ParseKey::new("a.py", "h1"), result());
        cache.set(ParseKey::new("a.py", "h2"), result());
        cache.set(ParseKey::new("b.py", "h1"), result());

        assert_eq!(cache.invalidate("a.py"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&ParseKey::new("b.py", "h1")).is_some());
    }

    #[test]
    fn test_prune_oldest() {
        let mut cache = ParseCache::new(8);
        for i in 0..5 {
            cache.set(ParseKey::new(format!("f{}.py", i), "h"), result());
        }
        assert_eq!(cache.prune_oldest(3), 3);
        assert_eq!(cache.len(), 2);
        // Oldest entries went first.
        assert!(cache.get(&ParseKey::new("f4.py", "h")).is_some());
        assert!(cache.get(&ParseKey::new("f0.py", "h")).is_none());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut cache = ParseCache::new(0);
        cache.set(ParseKey::new("a.py", "h"), result());
        assert_eq!(cache.len(), 1);
    }
}
