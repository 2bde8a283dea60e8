//! Dynamic route resolution caching
//!
//! Resolving a dynamic route walks every dynamic pattern in registration order.
//! The cache remembers, per route name, which pattern won and what it captured,
//! with LRU eviction. Static routes never go through it.

use crate::{trace_log, RouteParams};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cached result of a dynamic match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMatch {
    /// Index of the winning entry among the dynamic routes
    pub index: usize,
    /// Parameters it captured
    pub params: RouteParams,
}

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
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

/// Route resolution cache with LRU eviction
#[derive(Debug)]
pub struct RouteCache {
    matches: LruCache<String, CachedMatch>,
    stats: CacheStats,
}

impl RouteCache {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// A capacity of zero is raised to one
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            matches: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    pub fn clear(&mut self) {
        trace_log!("Clearing route cache");
        self.matches.clear();
        self.stats.invalidations += 1;
    }

    pub fn get(&mut self, name: &str) -> Option<CachedMatch> {
        if let Some(cached) = self.matches.get(name) {
            self.stats.hits += 1;
            trace_log!("Route cache hit for '{}'", name);
            Some(cached.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Route cache miss for '{}'", name);
            None
        }
    }

    pub fn insert(&mut self, name: String, index: usize, params: RouteParams) {
        self.matches.push(name, CachedMatch { index, params });
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.matches.cap().get()
    }
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new()
    }
}
