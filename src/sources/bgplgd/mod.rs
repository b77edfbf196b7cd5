//! OpenBGPD bgplgd source
//!
//! Endpoints used:
//! 1. /neighbors - all neighbors with prefix counters
//! 2. /summary - session summary, used for the status view
//! 3. /rib?neighbor={id} - routes learnt from one neighbor
//! 4. /rib - routes learnt from all neighbors
//!
//! bgplgd knows nothing about route-server ids or reject communities: both
//! the `route_server_id` stamp and the imported/filtered split are done here.
//!
//! `neighbors_summary` does not alias `neighbors`: it skips the per-neighbor
//! RIB requests that `neighbors` makes to count filtered routes.

pub mod client;
pub mod decoders;

use self::client::BgplgdClient;
use self::decoders::{decode_neighbors, decode_neighbors_status, decode_routes};
use super::{cached_neighbors, cached_routes, log_source_setup, Source};
use crate::api::{
    Meta, NeighborsResponse, NeighborsStatusResponse, Route, RoutesResponse, Status,
    StatusResponse,
};
use crate::cache::{CacheConfig, NeighborsCache, RoutesCache};
use crate::classifier::{classify, received_routes, rejected_routes, RejectPolicy};
use crate::config::{BackendKind, BgplgdConfig};
use crate::errors::{SourceError, SourceResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;

/// Version stamped into every response envelope
pub const BGPLGD_SOURCE_VERSION: &str = "1.0";

pub struct BgplgdSource {
    id: String,
    config: BgplgdConfig,
    client: BgplgdClient,
    policy: RejectPolicy,

    neighbors_cache: NeighborsCache,
    neighbors_summary_cache: NeighborsCache,

    routes_cache: RoutesCache,
    routes_received_cache: RoutesCache,
    routes_filtered_cache: RoutesCache,
}

impl BgplgdSource {
    pub fn new(id: impl Into<String>, config: BgplgdConfig) -> SourceResult<Self> {
        let id = id.into();
        let policy = RejectPolicy::parse(&config.reject_communities)
            .map_err(|e| SourceError::Config(format!("route server '{}': {}", id, e)))?;
        let client = BgplgdClient::new(config.clone())?;

        let cache_config = CacheConfig::new(config.cache_ttl(), config.routes_cache_size);
        log_source_setup(LogTag::Bgplgd, &id, &cache_config, &policy);

        logger::info(
            LogTag::Bgplgd,
            &format!("{}: bgplgd source for {}", id, config.api),
        );

        Ok(Self {
            id,
            client,
            policy,
            neighbors_cache: NeighborsCache::new(cache_config),
            neighbors_summary_cache: NeighborsCache::new(cache_config),
            routes_cache: RoutesCache::new(cache_config),
            routes_received_cache: RoutesCache::new(cache_config),
            routes_filtered_cache: RoutesCache::new(cache_config),
            config,
        })
    }

    fn make_response_meta(&self) -> Meta {
        Meta::new(BGPLGD_SOURCE_VERSION, self.config.cache_ttl())
    }

    async fn fetch_neighbor_routes(&self, neighbor_id: &str) -> SourceResult<Vec<Route>> {
        let body = self.client.show_neighbor_rib(neighbor_id).await?;
        decode_routes(&body)
    }

    async fn fetch_neighbors(&self) -> SourceResult<NeighborsResponse> {
        let body = self.client.show_neighbors().await?;
        let mut neighbors = decode_neighbors(&body)?;
        for neighbor in neighbors.iter_mut() {
            neighbor.route_server_id = self.id.clone();
        }

        Ok(NeighborsResponse {
            meta: self.make_response_meta(),
            neighbors,
        })
    }
}

#[async_trait]
impl Source for BgplgdSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Bgplgd
    }

    /// bgplgd has no status document; reachability shows in the other calls
    async fn status(&self) -> SourceResult<StatusResponse> {
        Ok(StatusResponse {
            meta: self.make_response_meta(),
            status: Status {
                server_time: chrono::Utc::now(),
                router_id: String::new(),
                version: "openbgpd".to_string(),
                message: "openbgpd up and running".to_string(),
                backend: "bgplgd".to_string(),
            },
        })
    }

    async fn neighbors(&self) -> SourceResult<NeighborsResponse> {
        cached_neighbors(LogTag::Bgplgd, &self.neighbors_cache, || async move {
            let mut response = self.fetch_neighbors().await?;

            // One RIB request per neighbor; any failure fails the whole list
            for neighbor in response.neighbors.iter_mut() {
                let filtered = self.routes_filtered(&neighbor.id).await?;
                neighbor.routes_filtered = filtered.filtered.len() as u64;
                neighbor.routes_accepted = neighbor
                    .routes_received
                    .saturating_sub(neighbor.routes_filtered);
            }
            Ok(response)
        })
        .await
    }

    async fn neighbors_summary(&self) -> SourceResult<NeighborsResponse> {
        cached_neighbors(LogTag::Bgplgd, &self.neighbors_summary_cache, || {
            self.fetch_neighbors()
        })
        .await
    }

    async fn neighbors_status(&self) -> SourceResult<NeighborsStatusResponse> {
        let body = self.client.show_summary().await?;
        let neighbors = decode_neighbors_status(&body)?;

        Ok(NeighborsStatusResponse {
            meta: self.make_response_meta(),
            neighbors,
        })
    }

    async fn routes(&self, neighbor_id: &str) -> SourceResult<RoutesResponse> {
        cached_routes(LogTag::Bgplgd, &self.routes_cache, neighbor_id, || async move {
            let routes = self.fetch_neighbor_routes(neighbor_id).await?;
            let classified = classify(routes, &self.policy);

            Ok(RoutesResponse {
                meta: self.make_response_meta(),
                imported: classified.imported,
                not_exported: Vec::new(),
                filtered: classified.filtered,
            })
        })
        .await
    }

    async fn routes_received(&self, neighbor_id: &str) -> SourceResult<RoutesResponse> {
        cached_routes(
            LogTag::Bgplgd,
            &self.routes_received_cache,
            neighbor_id,
            || async move {
                let routes = self.fetch_neighbor_routes(neighbor_id).await?;

                let mut response = RoutesResponse::empty(self.make_response_meta());
                response.imported = received_routes(routes, &self.policy);
                Ok(response)
            },
        )
        .await
    }

    async fn routes_filtered(&self, neighbor_id: &str) -> SourceResult<RoutesResponse> {
        cached_routes(
            LogTag::Bgplgd,
            &self.routes_filtered_cache,
            neighbor_id,
            || async move {
                let routes = self.fetch_neighbor_routes(neighbor_id).await?;

                let mut response = RoutesResponse::empty(self.make_response_meta());
                response.filtered = rejected_routes(routes, &self.policy);
                Ok(response)
            },
        )
        .await
    }

    /// bgplgd cannot tell which routes were withheld from export
    async fn routes_not_exported(&self, _neighbor_id: &str) -> SourceResult<RoutesResponse> {
        Ok(RoutesResponse::empty(self.make_response_meta()))
    }

    async fn all_routes(&self) -> SourceResult<RoutesResponse> {
        let body = self.client.show_rib().await?;
        let routes = decode_routes(&body)?;
        let classified = classify(routes, &self.policy);

        Ok(RoutesResponse {
            meta: self.make_response_meta(),
            imported: classified.imported,
            not_exported: Vec::new(),
            filtered: classified.filtered,
        })
    }

    fn expire_caches(&self) -> usize {
        self.neighbors_cache.expire()
            + self.neighbors_summary_cache.expire()
            + self.routes_cache.expire()
            + self.routes_received_cache.expire()
            + self.routes_filtered_cache.expire()
    }
}
