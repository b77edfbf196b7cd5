//! GoBGP source against an in-memory GobgpApi

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use lg_sources::api::{NeighborState, Route};
use lg_sources::config::GobgpConfig;
use lg_sources::sources::gobgp::client::{GobgpApi, RecordStream};
use lg_sources::sources::gobgp::peers::peer_hash;
use lg_sources::sources::gobgp::proto::{
    pack, AfiSafi, AfiSafiState, Afi, Destination, Family, GetBgpResponse, Global,
    LargeCommunitiesAttribute, LargeCommunity, ListPathRequest, ListPathResponse,
    ListPeerRequest, ListPeerResponse, NextHopAttribute, Path, Peer, PeerConf, PeerState,
    SessionState, TableType, LARGE_COMMUNITIES_ATTRIBUTE, NEXT_HOP_ATTRIBUTE,
};
use lg_sources::sources::gobgp::GobgpSource;
use lg_sources::{Source, SourceError, SourceResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct MockGobgp {
    peers: Vec<Peer>,
    tables: HashMap<(String, i32), Vec<Destination>>,
    delay: Option<Duration>,
    failing: AtomicBool,
    list_peer_calls: AtomicUsize,
    list_path_calls: AtomicUsize,
}

/// Client handed to the source; the test keeps the other handle
struct MockClient(Arc<MockGobgp>);

#[async_trait]
impl GobgpApi for MockClient {
    async fn get_bgp(&self) -> SourceResult<GetBgpResponse> {
        Ok(GetBgpResponse {
            global: Some(Global {
                asn: 65000,
                router_id: "192.0.2.254".to_string(),
                listen_port: 179,
            }),
        })
    }

    async fn list_peer(
        &self,
        _request: ListPeerRequest,
    ) -> SourceResult<RecordStream<ListPeerResponse>> {
        let mock = &self.0;
        mock.list_peer_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = mock.delay {
            tokio::time::sleep(delay).await;
        }
        if mock.failing.load(Ordering::SeqCst) {
            return Err(SourceError::unreachable("mock", "connection refused"));
        }

        let records: Vec<SourceResult<ListPeerResponse>> = mock
            .peers
            .iter()
            .map(|peer| Ok(ListPeerResponse { peer: Some(peer.clone()) }))
            .collect();
        Ok(stream::iter(records).boxed())
    }

    async fn list_path(
        &self,
        request: ListPathRequest,
    ) -> SourceResult<RecordStream<ListPathResponse>> {
        let mock = &self.0;
        mock.list_path_calls.fetch_add(1, Ordering::SeqCst);

        // Only IPv4 unicast holds paths in this backend
        let ipv4 = request.family.map(|f| f.afi) == Some(Afi::Ip as i32);
        let destinations = match mock.tables.get(&(request.name, request.table_type)) {
            Some(destinations) if ipv4 => destinations.clone(),
            _ => Vec::new(),
        };

        let records: Vec<SourceResult<ListPathResponse>> = destinations
            .into_iter()
            .map(|d| Ok(ListPathResponse { destination: Some(d) }))
            .collect();
        Ok(stream::iter(records).boxed())
    }
}

fn peer(address: &str, asn: u32, state: SessionState, received: u64, accepted: u64) -> Peer {
    Peer {
        conf: Some(PeerConf {
            description: format!("AS{}", asn),
            local_asn: 65000,
            neighbor_address: address.to_string(),
            peer_asn: asn,
            ..Default::default()
        }),
        state: Some(PeerState {
            neighbor_address: address.to_string(),
            peer_asn: asn,
            local_asn: 65000,
            session_state: state as i32,
            ..Default::default()
        }),
        timers: None,
        afi_safis: vec![AfiSafi {
            state: Some(AfiSafiState {
                family: Some(Family::ipv4_unicast()),
                enabled: true,
                received,
                accepted,
                advertised: 0,
            }),
        }],
    }
}

fn destination(prefix: &str, next_hop: &str, large: &[(u32, u32, u32)], filtered: bool) -> Destination {
    let path = Path {
        pattrs: vec![
            pack(
                NEXT_HOP_ATTRIBUTE,
                &NextHopAttribute {
                    next_hop: next_hop.to_string(),
                },
            ),
            pack(
                LARGE_COMMUNITIES_ATTRIBUTE,
                &LargeCommunitiesAttribute {
                    communities: large
                        .iter()
                        .map(|&(global_admin, local_data1, local_data2)| LargeCommunity {
                            global_admin,
                            local_data1,
                            local_data2,
                        })
                        .collect(),
                },
            ),
        ],
        best: true,
        filtered,
        neighbor_ip: next_hop.to_string(),
        ..Default::default()
    };

    Destination {
        prefix: prefix.to_string(),
        paths: vec![path],
    }
}

fn backend() -> MockGobgp {
    let mut tables = HashMap::new();
    tables.insert(
        ("192.0.2.1".to_string(), TableType::AdjIn as i32),
        vec![
            destination("198.51.100.0/24", "192.0.2.1", &[], false),
            destination("203.0.113.0/24", "192.0.2.1", &[(65000, 0, 1)], false),
            destination("192.0.2.128/25", "192.0.2.1", &[], true),
        ],
    );
    tables.insert(
        ("192.0.2.1".to_string(), TableType::AdjOut as i32),
        vec![
            destination("10.0.0.0/8", "192.0.2.254", &[], true),
            destination("172.16.0.0/12", "192.0.2.254", &[], false),
        ],
    );
    tables.insert(
        ("192.0.2.2".to_string(), TableType::AdjIn as i32),
        vec![destination("100.64.0.0/10", "192.0.2.2", &[], false)],
    );

    MockGobgp {
        peers: vec![
            peer("192.0.2.1", 64496, SessionState::Established, 3, 1),
            peer("192.0.2.2", 64497, SessionState::Idle, 0, 0),
        ],
        tables,
        ..Default::default()
    }
}

fn config() -> GobgpConfig {
    GobgpConfig {
        host: "127.0.0.1:50051".to_string(),
        processing_timeout_secs: 5,
        reject_communities: vec!["65000:0:*".to_string()],
        ..Default::default()
    }
}

fn source(mock: Arc<MockGobgp>) -> GobgpSource {
    GobgpSource::with_client("rs2", config(), Box::new(MockClient(mock))).unwrap()
}

fn peer_id(mock: &MockGobgp, index: usize) -> String {
    peer_hash(&mock.peers[index])
}

fn networks(routes: &[Route]) -> Vec<String> {
    routes.iter().map(|r| r.network.clone()).collect()
}

#[tokio::test]
async fn test_neighbors_from_peer_stream() {
    let mock = Arc::new(backend());
    let source = source(mock.clone());

    let response = source.neighbors().await.unwrap();
    assert_eq!(response.neighbors.len(), 2);

    let up = &response.neighbors[0];
    assert_eq!(up.id, peer_id(&mock, 0));
    assert_eq!(up.address, "192.0.2.1");
    assert_eq!(up.asn, 64496);
    assert_eq!(up.state, NeighborState::Up);
    assert_eq!(up.route_server_id, "rs2");
    assert_eq!(up.routes_received, 3);
    assert_eq!(up.routes_accepted, 1);
    assert_eq!(up.routes_filtered, 2);

    assert_eq!(response.neighbors[1].state, NeighborState::Down);
    assert_eq!(response.neighbors[1].uptime, Duration::ZERO);

    let cached = source.neighbors().await.unwrap();
    assert!(cached.meta.result_from_cache);
    assert_eq!(mock.list_peer_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_summary_returns_same_identities() {
    let mock = Arc::new(backend());
    let source = source(mock.clone());

    let full: Vec<String> = source
        .neighbors()
        .await
        .unwrap()
        .neighbors
        .into_iter()
        .map(|n| n.id)
        .collect();
    let summary: Vec<String> = source
        .neighbors_summary()
        .await
        .unwrap()
        .neighbors
        .into_iter()
        .map(|n| n.id)
        .collect();

    assert_eq!(full, summary);
    assert_eq!(full, vec![peer_id(&mock, 0), peer_id(&mock, 1)]);
}

#[tokio::test]
async fn test_neighbors_status_is_not_cached() {
    let mock = Arc::new(backend());
    let source = source(mock.clone());

    let first = source.neighbors_status().await.unwrap();
    let states: Vec<NeighborState> = first.neighbors.iter().map(|n| n.state).collect();
    assert_eq!(states, vec![NeighborState::Up, NeighborState::Down]);

    source.neighbors_status().await.unwrap();
    assert_eq!(mock.list_peer_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_routes_are_classified() {
    let mock = Arc::new(backend());
    let source = source(mock.clone());
    let id = peer_id(&mock, 0);

    let response = source.routes(&id).await.unwrap();
    assert_eq!(networks(&response.imported), vec!["198.51.100.0/24"]);
    assert_eq!(
        networks(&response.filtered),
        vec!["203.0.113.0/24", "192.0.2.128/25"]
    );
    assert!(response.not_exported.is_empty());
    assert!(response.imported.iter().all(|r| r.neighbor_id == id));

    let received = source.routes_received(&id).await.unwrap();
    assert_eq!(networks(&received.imported), vec!["198.51.100.0/24"]);
    assert!(received.filtered.is_empty());

    let filtered = source.routes_filtered(&id).await.unwrap();
    assert!(filtered.imported.is_empty());
    assert_eq!(filtered.filtered.len(), 2);

    // Cached: no further path listings
    let calls = mock.list_path_calls.load(Ordering::SeqCst);
    assert!(source.routes(&id).await.unwrap().meta.result_from_cache);
    assert_eq!(mock.list_path_calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn test_routes_not_exported_from_adj_out() {
    let mock = Arc::new(backend());
    let source = source(mock.clone());

    let response = source.routes_not_exported(&peer_id(&mock, 0)).await.unwrap();
    assert!(response.imported.is_empty());
    assert!(response.filtered.is_empty());
    assert_eq!(response.not_exported.len(), 1);
    assert_eq!(response.not_exported[0].network, "10.0.0.0/8");
}

#[tokio::test]
async fn test_unknown_neighbor_is_not_found() {
    let source = source(Arc::new(backend()));
    assert!(matches!(
        source.routes("0123456789abcdef").await,
        Err(SourceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_all_routes_covers_every_peer() {
    let source = source(Arc::new(backend()));

    let response = source.all_routes().await.unwrap();
    assert_eq!(response.imported.len(), 2);
    assert_eq!(response.filtered.len(), 2);
    assert!(!response.meta.result_from_cache);
}

#[tokio::test]
async fn test_status_reports_router_id() {
    let source = source(Arc::new(backend()));

    let status = source.status().await.unwrap();
    assert_eq!(status.status.router_id, "192.0.2.254");
    assert_eq!(status.status.backend, "gobgp");

    assert!(matches!(
        source.lookup_prefix("198.51.100.0/24").await,
        Err(SourceError::NotImplemented(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_processing_timeout() {
    let mock = Arc::new(MockGobgp {
        delay: Some(Duration::from_secs(30)),
        ..backend()
    });
    let source = source(mock);

    let err = source.neighbors().await.unwrap_err();
    assert!(matches!(
        err,
        SourceError::BackendTimeout { timeout_secs: 5, .. }
    ));
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let mock = Arc::new(backend());
    let source = source(mock.clone());

    mock.failing.store(true, Ordering::SeqCst);
    let err = source.neighbors().await.unwrap_err();
    assert_eq!(err.kind(), "backend_unreachable");

    mock.failing.store(false, Ordering::SeqCst);
    let response = source.neighbors().await.unwrap();
    assert!(!response.meta.result_from_cache);
    assert_eq!(mock.list_peer_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_expire_caches_after_ttl() {
    let mock = Arc::new(backend());
    let config = GobgpConfig {
        cache_ttl_secs: 1,
        ..config()
    };
    let source = GobgpSource::with_client("rs2", config, Box::new(MockClient(mock.clone()))).unwrap();

    source.neighbors().await.unwrap();
    assert_eq!(source.expire_caches(), 0);

    tokio::time::pause();
    tokio::time::advance(Duration::from_secs(2)).await;
    // neighbors plus the filtered view of both peers
    assert_eq!(source.expire_caches(), 3);
}

#[tokio::test]
async fn test_filtered_count_includes_reject_policy() {
    let mut tables = HashMap::new();
    tables.insert(
        ("192.0.2.1".to_string(), TableType::AdjIn as i32),
        vec![
            destination("198.51.100.0/24", "192.0.2.1", &[], false),
            destination("203.0.113.0/24", "192.0.2.1", &[(65000, 0, 1)], false),
        ],
    );
    // The backend accepted both paths
    let mock = Arc::new(MockGobgp {
        peers: vec![peer("192.0.2.1", 64496, SessionState::Established, 2, 2)],
        tables,
        ..Default::default()
    });
    let source = source(mock.clone());
    let id = peer_id(&mock, 0);

    let neighbors = source.neighbors().await.unwrap();
    let neighbor = &neighbors.neighbors[0];
    assert_eq!(neighbor.routes_filtered, 1);
    assert_eq!(neighbor.routes_accepted, 1);

    let filtered = source.routes_filtered(&id).await.unwrap();
    assert_eq!(filtered.filtered.len() as u64, neighbor.routes_filtered);
    assert!(filtered.meta.result_from_cache);

    // The summary only knows the backend counters
    let summary = source.neighbors_summary().await.unwrap();
    assert_eq!(summary.neighbors[0].routes_filtered, 0);
    assert_eq!(summary.neighbors[0].routes_accepted, 2);
}

#[tokio::test]
async fn test_summary_skips_path_listings() {
    let mock = Arc::new(backend());
    let source = source(mock.clone());

    let summary = source.neighbors_summary().await.unwrap();
    assert_eq!(summary.neighbors[0].routes_filtered, 2);
    assert_eq!(mock.list_path_calls.load(Ordering::SeqCst), 0);

    assert!(source.neighbors_summary().await.unwrap().meta.result_from_cache);
    assert_eq!(mock.list_peer_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_and_expiry() {
    let mock = Arc::new(backend());
    let config = GobgpConfig {
        cache_ttl_secs: 1,
        routes_cache_size: 1,
        ..config()
    };
    let source = Arc::new(
        GobgpSource::with_client("rs2", config, Box::new(MockClient(mock.clone()))).unwrap(),
    );
    let ids = [peer_id(&mock, 0), peer_id(&mock, 1)];

    let mut tasks = Vec::new();
    for worker in 0..8 {
        let source = source.clone();
        let ids = ids.clone();
        tasks.push(tokio::spawn(async move {
            for round in 0..25 {
                let id = &ids[(worker + round) % 2];
                let routes = source.routes(id).await.unwrap();
                let filtered = source.routes_filtered(id).await.unwrap();
                let received = source.routes_received(id).await.unwrap();
                assert_eq!(routes.filtered.len(), filtered.filtered.len());
                assert_eq!(routes.imported, received.imported);

                let neighbors = source.neighbors().await.unwrap();
                assert_eq!(neighbors.neighbors.len(), 2);
                assert_eq!(neighbors.neighbors[0].routes_filtered, 2);
            }
        }));
    }

    let sweeper = {
        let source = source.clone();
        tokio::spawn(async move {
            let mut removed = 0;
            for _ in 0..50 {
                removed += source.expire_caches();
                tokio::task::yield_now().await;
            }
            removed
        })
    };

    for task in tasks {
        task.await.unwrap();
    }
    let removed = sweeper.await.unwrap();

    // Five keyed caches of one entry each, two singletons
    assert!(removed <= 8 * 25 * 5);
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(source.expire_caches() <= 7);
    assert_eq!(source.expire_caches(), 0);
}
