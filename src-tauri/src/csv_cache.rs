use lru::LruCache;
use std::num::NonZeroUsize;

/// Remembers the matching record indices of recent queries for the table
/// that is currently loaded. Keys are lowercased since matching ignores case.
/// Must be cleared whenever the records change.
pub struct FilterCache {
    cache: LruCache<String, Vec<usize>>,
}

impl FilterCache {
    pub fn new(capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(size),
        }
    }

    pub fn get(&mut self, query: &str) -> Option<Vec<usize>> {
        self.cache.get(query.to_lowercase().as_str()).cloned()
    }

    pub fn put(&mut self, query: &str, matches: Vec<usize>) {
        self.cache.put(query.to_lowercase(), matches);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
