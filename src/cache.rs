//! Bounded memoization for the count and sample queries.

use lru::LruCache;
use std::{
    hash::Hash,
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Time source of a cache.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry<V> {
    value: V,
    stored: Instant,
}

/// Thread-safe LRU cache with an optional time-to-live.
///
/// Without a TTL entries only leave the cache when evicted.
pub struct BoundedCache<K: Hash + Eq, V: Clone> {
    inner: Mutex<LruCache<K, Entry<V>>>,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl<K: Hash + Eq, V: Clone> BoundedCache<K, V> {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, None, Arc::new(SystemClock))
    }

    pub fn with_ttl(capacity: usize, ttl: Option<Duration>) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Option<Duration>, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
            clock,
        }
    }

    /// The cached value, promoted to most recently used. Expired entries
    /// are dropped.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match (inner.get(key), self.ttl) {
            (None, _) => return None,
            (Some(entry), Some(ttl)) => now.duration_since(entry.stored) >= ttl,
            (Some(_), None) => false,
        };
        if expired {
            inner.pop(key);
            return None;
        }
        inner.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let stored = self.clock.now();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.put(key, Entry { value, stored });
    }

    /// Returns the cached value or computes and stores it. Errors are not
    /// cached.
    pub fn get_or_try_insert<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        K: Clone,
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).cap().get()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
