//! Route-server sources
//!
//! A `Source` is the uniform query surface over one route server. Two
//! backends implement it:
//! - `bgplgd`: OpenBGPD's HTTP/JSON looking-glass daemon, one GET per query
//! - `gobgp`: GoBGP's gRPC API, server-streaming peer and path dumps
//!
//! The backend is chosen once from configuration by [`build_source`]. Every
//! data-returning call follows the same shape: cache check, backend call on
//! miss, decode, classify (routes only), stamp the envelope, store, return.
//! Dropping a returned future cancels the in-flight backend call; nothing is
//! cached for it.

pub mod bgplgd;
pub mod gobgp;
pub mod registry;

pub use registry::SourceRegistry;

use crate::api::{
    Envelope, NeighborsResponse, NeighborsStatusResponse, RoutesLookupResponse, RoutesResponse,
    StatusResponse,
};
use crate::cache::{CacheConfig, NeighborsCache, RoutesCache};
use crate::classifier::RejectPolicy;
use crate::config::{BackendKind, SourceConfig};
use crate::errors::{SourceError, SourceResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

#[async_trait]
pub trait Source: Send + Sync {
    /// Route server id from configuration
    fn id(&self) -> &str;

    fn backend(&self) -> BackendKind;

    /// Liveness and version of the route server; never cached
    async fn status(&self) -> SourceResult<StatusResponse>;

    /// All neighbors including their filtered-route counts
    async fn neighbors(&self) -> SourceResult<NeighborsResponse>;

    /// All neighbors without per-neighbor route lookups
    async fn neighbors_summary(&self) -> SourceResult<NeighborsResponse>;

    /// Up/down state and uptime of all neighbors; never cached
    async fn neighbors_status(&self) -> SourceResult<NeighborsStatusResponse>;

    /// Imported and filtered routes of a neighbor
    async fn routes(&self, neighbor_id: &str) -> SourceResult<RoutesResponse>;

    /// Imported routes of a neighbor
    async fn routes_received(&self, neighbor_id: &str) -> SourceResult<RoutesResponse>;

    /// Filtered routes of a neighbor
    async fn routes_filtered(&self, neighbor_id: &str) -> SourceResult<RoutesResponse>;

    /// Routes of a neighbor withheld from export
    async fn routes_not_exported(&self, neighbor_id: &str) -> SourceResult<RoutesResponse>;

    /// Full RIB of all neighbors; never cached
    async fn all_routes(&self) -> SourceResult<RoutesResponse>;

    /// Prefix search on the route server itself
    async fn lookup_prefix(&self, prefix: &str) -> SourceResult<RoutesLookupResponse> {
        let _ = prefix;
        Err(SourceError::NotImplemented(format!(
            "{}: prefix lookup is not supported by the {:?} backend",
            self.id(),
            self.backend()
        )))
    }

    /// Drop expired entries from all caches, returning how many were removed
    fn expire_caches(&self) -> usize;
}

/// Build the source for one configured route server
///
/// Must be called from within a tokio runtime: the gRPC channel of a GoBGP
/// source is created lazily on it.
pub fn build_source(config: &SourceConfig) -> SourceResult<Arc<dyn Source>> {
    config.validate()?;

    match (config.backend(), &config.bgplgd, &config.gobgp) {
        (Some(BackendKind::Bgplgd), Some(cfg), _) => Ok(Arc::new(bgplgd::BgplgdSource::new(
            config.id.clone(),
            cfg.clone(),
        )?)),
        (Some(BackendKind::Gobgp), _, Some(cfg)) => Ok(Arc::new(gobgp::GobgpSource::connect(
            config.id.clone(),
            cfg.clone(),
        )?)),
        _ => Err(SourceError::Config(format!(
            "route server '{}' has no usable backend",
            config.id
        ))),
    }
}

// ============================================================================
// CACHE SKELETON
// ============================================================================

/// Startup note on what a source caches and classifies
///
/// A zero TTL disables every cache of the source. A zero `routes_cache_size`
/// only disables the keyed routes caches; the neighbors caches stay active.
pub(crate) fn log_source_setup(
    tag: LogTag,
    id: &str,
    cache_config: &CacheConfig,
    policy: &RejectPolicy,
) {
    if cache_config.ttl.is_zero() {
        logger::info(tag, &format!("{}: caching disabled", id));
    } else if cache_config.capacity == 0 {
        logger::info(tag, &format!("{}: routes caching disabled", id));
    }
    if policy.is_empty() {
        logger::debug(
            tag,
            &format!("{}: no reject communities, every route is imported", id),
        );
    }
}

/// Serve a per-neighbor routes response from `cache` or fetch and store it
pub(crate) async fn cached_routes<F, Fut>(
    tag: LogTag,
    cache: &RoutesCache,
    neighbor_id: &str,
    fetch: F,
) -> SourceResult<RoutesResponse>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = SourceResult<RoutesResponse>>,
{
    let key = neighbor_id.to_string();
    if let Some(hit) = cache.get(&key) {
        logger::debug(tag, &format!("routes cache hit for {}", neighbor_id));
        return Ok(hit.served_from_cache());
    }

    logger::debug(tag, &format!("routes cache miss for {}", neighbor_id));
    let response = fetch().await?;
    cache.set(key, response.clone());
    Ok(response)
}

/// Serve a neighbors response from `cache` or fetch and store it
pub(crate) async fn cached_neighbors<F, Fut>(
    tag: LogTag,
    cache: &NeighborsCache,
    fetch: F,
) -> SourceResult<NeighborsResponse>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = SourceResult<NeighborsResponse>>,
{
    if let Some(hit) = cache.get() {
        logger::debug(tag, "neighbors cache hit");
        return Ok(hit.served_from_cache());
    }

    logger::debug(tag, "neighbors cache miss");
    let response = fetch().await?;
    cache.set(response.clone());
    Ok(response)
}
