/// In-memory caches with TTL and LRU eviction
///
/// `KeyedCache` holds per-neighbor responses, `SingletonCache` a single
/// whole-collection response. Both are thread-safe and track metrics.
///
/// `get` never removes anything: expired entries stay invisible until the next
/// `expire()` sweep, which is the only place they are dropped.
use super::config::CacheConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry with TTL tracking
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    last_accessed: u64,
}

impl<V> CacheEntry<V> {
    /// A deadline past the clock's range never expires
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.inserted_at
            .checked_add(ttl)
            .map_or(false, |deadline| deadline <= now)
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
}

struct KeyedInner<K, V> {
    data: HashMap<K, CacheEntry<V>>,
    // Monotonic access counter, orders entries for LRU eviction
    clock: u64,
    metrics: CacheMetrics,
}

/// Size-bounded cache keyed by neighbor id
pub struct KeyedCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    config: CacheConfig,
    inner: Mutex<KeyedInner<K, V>>,
}

impl<K, V> KeyedCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(KeyedInner {
                data: HashMap::new(),
                clock: 0,
                metrics: CacheMetrics::default(),
            }),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.config.is_disabled()
    }

    /// Get a live value; `None` if missing, expired or the cache is disabled
    pub fn get(&self, key: &K) -> Option<V> {
        if self.is_disabled() {
            return None;
        }

        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let tick = inner.clock;

        let value = match inner.data.get_mut(key) {
            Some(entry) if !entry.is_expired(self.config.ttl, now) => {
                entry.last_accessed = tick;
                Some(entry.value.clone())
            }
            _ => None,
        };

        if value.is_some() {
            inner.metrics.hits += 1;
        } else {
            inner.metrics.misses += 1;
        }
        value
    }

    /// Insert or replace a value, evicting the least recently used entry at capacity
    pub fn set(&self, key: K, value: V) {
        if self.is_disabled() {
            return;
        }

        let mut inner = self.inner.lock();
        if inner.data.len() >= self.config.capacity && !inner.data.contains_key(&key) {
            Self::evict_lru(&mut inner);
        }

        inner.clock += 1;
        let tick = inner.clock;
        inner.data.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                last_accessed: tick,
            },
        );
        inner.metrics.inserts += 1;
    }

    /// Remove every expired entry, returning how many were removed
    pub fn expire(&self) -> usize {
        let now = Instant::now();
        let ttl = self.config.ttl;
        let mut inner = self.inner.lock();

        let before = inner.data.len();
        inner.data.retain(|_, entry| !entry.is_expired(ttl, now));
        let removed = before - inner.data.len();

        inner.metrics.expirations += removed as u64;
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().data.clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.inner.lock().metrics.clone()
    }

    fn evict_lru(inner: &mut KeyedInner<K, V>) {
        let lru_key = inner
            .data
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(k, _)| k.clone());

        if let Some(lru_key) = lru_key {
            inner.data.remove(&lru_key);
            inner.metrics.evictions += 1;
        }
    }
}

struct SingletonInner<V> {
    slot: Option<CacheEntry<V>>,
    metrics: CacheMetrics,
}

/// Single-slot cache for whole-collection responses
pub struct SingletonCache<V: Clone> {
    ttl: Duration,
    inner: Mutex<SingletonInner<V>>,
}

impl<V: Clone> SingletonCache<V> {
    /// Only the TTL of `config` applies; the slot always holds at most one value
    pub fn new(config: CacheConfig) -> Self {
        Self {
            ttl: config.ttl,
            inner: Mutex::new(SingletonInner {
                slot: None,
                metrics: CacheMetrics::default(),
            }),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl.is_zero()
    }

    pub fn get(&self) -> Option<V> {
        if self.is_disabled() {
            return None;
        }

        let now = Instant::now();
        let mut inner = self.inner.lock();
        let value = match &inner.slot {
            Some(entry) if !entry.is_expired(self.ttl, now) => Some(entry.value.clone()),
            _ => None,
        };

        if value.is_some() {
            inner.metrics.hits += 1;
        } else {
            inner.metrics.misses += 1;
        }
        value
    }

    pub fn set(&self, value: V) {
        if self.is_disabled() {
            return;
        }

        let mut inner = self.inner.lock();
        inner.slot = Some(CacheEntry {
            value,
            inserted_at: Instant::now(),
            last_accessed: 0,
        });
        inner.metrics.inserts += 1;
    }

    pub fn expire(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let expired = matches!(&inner.slot, Some(entry) if entry.is_expired(self.ttl, now));
        if !expired {
            return 0;
        }
        inner.slot = None;
        inner.metrics.expirations += 1;
        1
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.inner.lock().metrics.clone()
    }
}
