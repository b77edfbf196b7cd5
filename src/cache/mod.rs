//! Response caches owned by a single source
//!
//! Caches are never shared between sources: each route server gets its own
//! independent cache state. Errors are never cached.

pub mod config;
pub mod manager;

pub use config::CacheConfig;
pub use manager::{CacheMetrics, KeyedCache, SingletonCache};

use crate::api::{NeighborsResponse, RoutesResponse};

/// Whole neighbor list of a route server
pub type NeighborsCache = SingletonCache<NeighborsResponse>;

/// Route responses keyed by neighbor id
pub type RoutesCache = KeyedCache<String, RoutesResponse>;
