/// Cache configuration per source
///
/// Every source derives one `CacheConfig` from its backend block: the TTL is
/// shared by all caches of the source, the capacity bounds keyed caches only.
/// A zero TTL disables caching entirely.
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live for cached entries
    pub ttl: Duration,

    /// Maximum number of entries in a keyed cache (LRU eviction when exceeded)
    pub capacity: usize,
}

impl CacheConfig {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self { ttl, capacity }
    }

    /// Stateless configuration: every lookup misses
    pub fn disabled() -> Self {
        Self {
            ttl: Duration::ZERO,
            capacity: 0,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl.is_zero() || self.capacity == 0
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300), // 5 minutes
            capacity: 128,
        }
    }
}
