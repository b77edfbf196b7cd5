//! GoBGP gRPC source
//!
//! RPCs used:
//! 1. GetBgp - router id for the status view
//! 2. ListPeer - all peers with per-family prefix counters (streamed)
//! 3. ListPath - per-peer ADJ_IN / ADJ_OUT tables (streamed)
//!
//! Every logical request runs under the configured processing timeout; when
//! it elapses the request fails with `BackendTimeout` and the streams are
//! dropped. Neighbor ids are peer hashes (see [`peers::peer_hash`]), so a
//! per-neighbor request first scans `ListPeer` for the matching peer.
//!
//! `neighbors` counts each neighbor's filtered routes from its
//! `routes_filtered` view, so backend-filtered paths and paths matching the
//! reject policy both count. `neighbors_summary` skips those ADJ_IN listings
//! and reports the backend's own counters (received minus accepted), which
//! do not see the reject policy.

pub mod client;
pub mod peers;
pub mod proto;
pub mod routes;

use self::client::{GobgpApi, GrpcClient};
use self::peers::{neighbor_from_peer, peer_address, peer_hash, status_from_peer};
use self::proto::{Family, ListPathRequest, ListPeerRequest, Peer, TableType};
use self::routes::route_from_path;
use super::{cached_neighbors, cached_routes, log_source_setup, Source};
use crate::api::{
    Meta, Neighbor, NeighborsResponse, NeighborsStatusResponse, Route, RoutesResponse, Status,
    StatusResponse,
};
use crate::cache::{CacheConfig, NeighborsCache, RoutesCache};
use crate::classifier::{Classified, RejectPolicy};
use crate::config::{BackendKind, GobgpConfig};
use crate::errors::{SourceError, SourceResult};
use crate::logger::{self, LogLevel, LogTag};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use std::future::Future;

/// Version stamped into every response envelope
pub const GOBGP_SOURCE_VERSION: &str = "1.0";

/// Address families queried per peer
const ROUTE_FAMILIES: [fn() -> Family; 2] = [Family::ipv4_unicast, Family::ipv6_unicast];

pub struct GobgpSource {
    id: String,
    config: GobgpConfig,
    client: Box<dyn GobgpApi>,
    policy: RejectPolicy,

    neighbors_cache: NeighborsCache,
    neighbors_summary_cache: NeighborsCache,

    routes_cache: RoutesCache,
    routes_received_cache: RoutesCache,
    routes_filtered_cache: RoutesCache,
    routes_not_exported_cache: RoutesCache,
}

impl GobgpSource {
    /// Source on a lazily connected gRPC channel to `config.host`
    pub fn connect(id: impl Into<String>, config: GobgpConfig) -> SourceResult<Self> {
        let client = GrpcClient::connect(&config)?;
        Self::with_client(id, config, Box::new(client))
    }

    /// Source on an existing client
    pub fn with_client(
        id: impl Into<String>,
        config: GobgpConfig,
        client: Box<dyn GobgpApi>,
    ) -> SourceResult<Self> {
        let id = id.into();
        let policy = RejectPolicy::parse(&config.reject_communities)
            .map_err(|e| SourceError::Config(format!("route server '{}': {}", id, e)))?;

        let cache_config = CacheConfig::new(config.cache_ttl(), config.routes_cache_size);
        log_source_setup(LogTag::Gobgp, &id, &cache_config, &policy);

        logger::info(
            LogTag::Gobgp,
            &format!("{}: GoBGP source for {}", id, config.host),
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
            routes_not_exported_cache: RoutesCache::new(cache_config),
            config,
        })
    }

    fn make_response_meta(&self) -> Meta {
        Meta::new(GOBGP_SOURCE_VERSION, self.config.cache_ttl())
    }

    /// Run one logical request under the processing timeout
    async fn with_timeout<T, F>(&self, operation: &str, request: F) -> SourceResult<T>
    where
        F: Future<Output = SourceResult<T>>,
    {
        let timeout = self.config.processing_timeout();
        let result = match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::timeout(operation, timeout)),
        };

        if let Err(e) = &result {
            logger::warning(
                LogTag::Gobgp,
                &format!("{}: {} failed: {}", self.id, operation, e),
            );
        }
        result
    }

    /// Drain the ListPeer stream
    async fn collect_peers(&self) -> SourceResult<Vec<Peer>> {
        let request = ListPeerRequest {
            address: String::new(),
            enable_advertised: true,
        };
        let mut stream = self.client.list_peer(request).await?;

        let mut peers = Vec::new();
        while let Some(record) = stream.next().await {
            if let Some(peer) = record?.peer {
                peers.push(peer);
            }
        }
        logger::debug(
            LogTag::Gobgp,
            &format!("{}: ListPeer returned {} peers", self.id, peers.len()),
        );
        Ok(peers)
    }

    async fn lookup_neighbor(&self, neighbor_id: &str) -> SourceResult<Peer> {
        self.collect_peers()
            .await?
            .into_iter()
            .find(|peer| peer_hash(peer) == neighbor_id)
            .ok_or_else(|| SourceError::neighbor_not_found(neighbor_id))
    }

    /// Routes of one peer table, paired with the backend's filtered flag
    async fn collect_paths(
        &self,
        peer: &Peer,
        table: TableType,
    ) -> SourceResult<Vec<(Route, bool)>> {
        let neighbor_id = peer_hash(peer);
        let address = peer_address(peer);
        let now = Utc::now();

        let mut routes = Vec::new();
        for family in ROUTE_FAMILIES {
            let request = ListPathRequest {
                table_type: table as i32,
                name: address.clone(),
                family: Some(family()),
                enable_filtered: true,
            };
            let mut stream = self.client.list_path(request).await?;

            while let Some(record) = stream.next().await {
                let Some(destination) = record?.destination else {
                    continue;
                };
                if logger::enabled(LogTag::Gobgp, LogLevel::Verbose) {
                    logger::verbose(
                        LogTag::Gobgp,
                        &format!(
                            "{}: {:?} {} has {} paths",
                            address,
                            table,
                            destination.prefix,
                            destination.paths.len()
                        ),
                    );
                }
                for path in destination.paths.iter().filter(|p| !p.is_withdraw) {
                    let route = route_from_path(&destination.prefix, path, &neighbor_id, now)?;
                    routes.push((route, path.filtered));
                }
            }
        }
        Ok(routes)
    }

    /// Split paths into imported and filtered, keeping arrival order
    ///
    /// A path is filtered if the backend's import policy filtered it or the
    /// reject policy matches one of its large communities.
    fn split_paths(&self, paths: Vec<(Route, bool)>) -> Classified {
        let mut classified = Classified::default();
        for (route, backend_filtered) in paths {
            if backend_filtered || self.policy.rejects(&route) {
                classified.filtered.push(route);
            } else {
                classified.imported.push(route);
            }
        }
        classified
    }

    /// Neighbors with the backend's prefix counters
    fn neighbors_from_peers(&self, peers: &[Peer]) -> Vec<Neighbor> {
        let now = Utc::now();
        peers
            .iter()
            .map(|peer| neighbor_from_peer(peer, &self.id, now))
            .collect()
    }

    /// Filtered view of a peer already taken from ListPeer
    async fn filtered_routes_of(&self, peer: &Peer) -> SourceResult<RoutesResponse> {
        let paths = self.collect_paths(peer, TableType::AdjIn).await?;
        let mut response = RoutesResponse::empty(self.make_response_meta());
        response.filtered = self.split_paths(paths).filtered;
        Ok(response)
    }

    async fn fetch_neighbor_routes(&self, neighbor_id: &str) -> SourceResult<Classified> {
        self.with_timeout("ListPath", async {
            let peer = self.lookup_neighbor(neighbor_id).await?;
            let paths = self.collect_paths(&peer, TableType::AdjIn).await?;
            Ok(self.split_paths(paths))
        })
        .await
    }
}

#[async_trait]
impl Source for GobgpSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Gobgp
    }

    async fn status(&self) -> SourceResult<StatusResponse> {
        let response = self.with_timeout("GetBgp", self.client.get_bgp()).await?;
        let router_id = response.global.map(|g| g.router_id).unwrap_or_default();

        Ok(StatusResponse {
            meta: self.make_response_meta(),
            status: Status {
                server_time: Utc::now(),
                router_id,
                version: "gobgp".to_string(),
                message: "gobgp up and running".to_string(),
                backend: "gobgp".to_string(),
            },
        })
    }

    async fn neighbors(&self) -> SourceResult<NeighborsResponse> {
        cached_neighbors(LogTag::Gobgp, &self.neighbors_cache, || async move {
            let neighbors = self
                .with_timeout("ListPath", async {
                    let peers = self.collect_peers().await?;
                    let mut neighbors = self.neighbors_from_peers(&peers);

                    // One ADJ_IN listing per peer, shared with routes_filtered
                    for (neighbor, peer) in neighbors.iter_mut().zip(&peers) {
                        let filtered = cached_routes(
                            LogTag::Gobgp,
                            &self.routes_filtered_cache,
                            &neighbor.id,
                            || self.filtered_routes_of(peer),
                        )
                        .await?;
                        neighbor.routes_filtered = filtered.filtered.len() as u64;
                        neighbor.routes_accepted = neighbor
                            .routes_received
                            .saturating_sub(neighbor.routes_filtered);
                    }
                    Ok(neighbors)
                })
                .await?;

            Ok(NeighborsResponse {
                meta: self.make_response_meta(),
                neighbors,
            })
        })
        .await
    }

    async fn neighbors_summary(&self) -> SourceResult<NeighborsResponse> {
        cached_neighbors(LogTag::Gobgp, &self.neighbors_summary_cache, || async move {
            let peers = self.with_timeout("ListPeer", self.collect_peers()).await?;

            Ok(NeighborsResponse {
                meta: self.make_response_meta(),
                neighbors: self.neighbors_from_peers(&peers),
            })
        })
        .await
    }

    async fn neighbors_status(&self) -> SourceResult<NeighborsStatusResponse> {
        let peers = self.with_timeout("ListPeer", self.collect_peers()).await?;
        let now = Utc::now();

        Ok(NeighborsStatusResponse {
            meta: self.make_response_meta(),
            neighbors: peers
                .iter()
                .map(|peer| status_from_peer(peer, now))
                .collect(),
        })
    }

    async fn routes(&self, neighbor_id: &str) -> SourceResult<RoutesResponse> {
        cached_routes(LogTag::Gobgp, &self.routes_cache, neighbor_id, || async move {
            let classified = self.fetch_neighbor_routes(neighbor_id).await?;

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
            LogTag::Gobgp,
            &self.routes_received_cache,
            neighbor_id,
            || async move {
                let classified = self.fetch_neighbor_routes(neighbor_id).await?;

                let mut response = RoutesResponse::empty(self.make_response_meta());
                response.imported = classified.imported;
                Ok(response)
            },
        )
        .await
    }

    async fn routes_filtered(&self, neighbor_id: &str) -> SourceResult<RoutesResponse> {
        cached_routes(
            LogTag::Gobgp,
            &self.routes_filtered_cache,
            neighbor_id,
            || {
                self.with_timeout("ListPath", async move {
                    let peer = self.lookup_neighbor(neighbor_id).await?;
                    self.filtered_routes_of(&peer).await
                })
            },
        )
        .await
    }

    /// Paths the export policy filtered from the peer's ADJ_OUT table
    async fn routes_not_exported(&self, neighbor_id: &str) -> SourceResult<RoutesResponse> {
        cached_routes(
            LogTag::Gobgp,
            &self.routes_not_exported_cache,
            neighbor_id,
            || async move {
                let paths = self
                    .with_timeout("ListPath", async {
                        let peer = self.lookup_neighbor(neighbor_id).await?;
                        self.collect_paths(&peer, TableType::AdjOut).await
                    })
                    .await?;

                let mut response = RoutesResponse::empty(self.make_response_meta());
                response.not_exported = paths
                    .into_iter()
                    .filter(|(_, filtered)| *filtered)
                    .map(|(route, _)| route)
                    .collect();
                Ok(response)
            },
        )
        .await
    }

    async fn all_routes(&self) -> SourceResult<RoutesResponse> {
        let classified = self
            .with_timeout("ListPath", async {
                let mut paths = Vec::new();
                for peer in self.collect_peers().await? {
                    paths.extend(self.collect_paths(&peer, TableType::AdjIn).await?);
                }
                Ok(self.split_paths(paths))
            })
            .await?;

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
            + self.routes_not_exported_cache.expire()
    }
}
