//! bgplgd source against an in-process HTTP backend

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use lg_sources::api::{LargeCommunity, NeighborState};
use lg_sources::config::BgplgdConfig;
use lg_sources::sources::bgplgd::BgplgdSource;
use lg_sources::{Source, SourceError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

const MODE_OK: u8 = 0;
const MODE_MALFORMED: u8 = 1;
const MODE_ERROR: u8 = 2;

const NEIGHBORS: &str = r#"{"neighbors":[
    {"remote_as":"64496","remote_addr":"192.0.2.1","description":"AS64496",
     "state":"Established","last_updown":"1d02h",
     "stats":{"prefixes":{"sent":10,"received":2}}},
    {"remote_as":"64497","remote_addr":"192.0.2.2","description":"AS64497",
     "state":"Idle","last_updown":"00:10:00",
     "stats":{"prefixes":{"sent":0,"received":0}}}
]}"#;

const RIB_PEER1: &str = r#"{"rib":[
    {"prefix":"198.51.100.0/24","aspath":"64496","exit_nexthop":"192.0.2.1",
     "neighbor":{"remote_addr":"192.0.2.1"},"origin":"IGP","localpref":100,
     "last_update_sec":30,"best":true,"large_communities":["64496:1:1"]},
    {"prefix":"203.0.113.0/24","aspath":"64496 64511","exit_nexthop":"192.0.2.1",
     "neighbor":{"remote_addr":"192.0.2.1"},"origin":"IGP","localpref":100,
     "last_update_sec":30,"best":true,"large_communities":["65000:0:7"]}
]}"#;

#[derive(Default)]
struct Backend {
    mode: AtomicU8,
    neighbors_requests: AtomicUsize,
    rib_requests: AtomicUsize,
}

type Reply = (StatusCode, [(header::HeaderName, &'static str); 1], String);

fn reply(backend: &Backend, body: &str) -> Reply {
    let json = [(header::CONTENT_TYPE, "application/json")];
    match backend.mode.load(Ordering::SeqCst) {
        MODE_MALFORMED => (StatusCode::OK, json, "<html>bad gateway</html>".to_string()),
        MODE_ERROR => (StatusCode::INTERNAL_SERVER_ERROR, json, "{}".to_string()),
        _ => (StatusCode::OK, json, body.to_string()),
    }
}

async fn neighbors(State(backend): State<Arc<Backend>>) -> impl IntoResponse {
    backend.neighbors_requests.fetch_add(1, Ordering::SeqCst);
    reply(&backend, NEIGHBORS)
}

async fn summary(State(backend): State<Arc<Backend>>) -> impl IntoResponse {
    reply(&backend, NEIGHBORS)
}

async fn rib(
    State(backend): State<Arc<Backend>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    backend.rib_requests.fetch_add(1, Ordering::SeqCst);
    match params.get("neighbor").map(String::as_str) {
        Some("192.0.2.1") | None => reply(&backend, RIB_PEER1),
        Some(_) => reply(&backend, r#"{"rib":[]}"#),
    }
}

async fn spawn_backend() -> (Arc<Backend>, String) {
    let backend = Arc::new(Backend::default());
    let app = Router::new()
        .route("/api/neighbors", get(neighbors))
        .route("/api/summary", get(summary))
        .route("/api/rib", get(rib))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (backend, format!("http://{}/api/", addr))
}

fn source(api: &str, cache_ttl_secs: u64) -> BgplgdSource {
    let config = BgplgdConfig {
        api: api.to_string(),
        cache_ttl_secs,
        request_timeout_secs: 5,
        reject_communities: vec!["65000:0:*".to_string()],
        ..Default::default()
    };
    BgplgdSource::new("rs1", config).unwrap()
}

#[tokio::test]
async fn test_neighbors_count_filtered_routes() {
    let (_backend, api) = spawn_backend().await;
    let source = source(&api, 300);

    let response = source.neighbors().await.unwrap();
    assert_eq!(response.neighbors.len(), 2);
    assert!(!response.meta.result_from_cache);

    let up = &response.neighbors[0];
    assert_eq!(up.id, "192.0.2.1");
    assert_eq!(up.asn, 64496);
    assert_eq!(up.state, NeighborState::Up);
    assert_eq!(up.route_server_id, "rs1");
    assert_eq!(up.routes_filtered, 1);
    assert_eq!(up.routes_accepted, 1);
    assert_eq!(up.uptime.as_secs(), 26 * 3600);

    let down = &response.neighbors[1];
    assert_eq!(down.state, NeighborState::Down);
    assert_eq!(down.routes_filtered, 0);
    assert_eq!(down.uptime.as_secs(), 0);
}

#[tokio::test]
async fn test_summary_skips_rib_lookups() {
    let (backend, api) = spawn_backend().await;
    let source = source(&api, 300);

    let summary = source.neighbors_summary().await.unwrap();
    let ids: Vec<&str> = summary.neighbors.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["192.0.2.1", "192.0.2.2"]);
    assert_eq!(backend.rib_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_neighbors_status() {
    let (_backend, api) = spawn_backend().await;
    let source = source(&api, 300);

    let status = source.neighbors_status().await.unwrap();
    assert_eq!(status.neighbors.len(), 2);
    assert_eq!(status.neighbors[0].state, NeighborState::Up);
    assert_eq!(status.neighbors[1].state, NeighborState::Down);
    assert_eq!(status.neighbors[1].since.as_secs(), 600);
}

#[tokio::test]
async fn test_routes_filtered_only_holds_rejected_routes() {
    let (_backend, api) = spawn_backend().await;
    let source = source(&api, 300);

    let response = source.routes_filtered("192.0.2.1").await.unwrap();
    assert!(response.imported.is_empty());
    assert!(response.not_exported.is_empty());
    assert_eq!(response.filtered.len(), 1);
    assert_eq!(response.filtered[0].network, "203.0.113.0/24");
    assert!(response.filtered[0].has_large_community(&LargeCommunity(65000, 0, 7)));

    let received = source.routes_received("192.0.2.1").await.unwrap();
    assert_eq!(received.imported.len(), 1);
    assert!(received.filtered.is_empty());
}

#[tokio::test]
async fn test_routes_are_served_from_cache() {
    let (backend, api) = spawn_backend().await;
    let source = source(&api, 300);

    let first = source.routes("192.0.2.1").await.unwrap();
    assert_eq!(first.imported.len(), 1);
    assert_eq!(first.filtered.len(), 1);
    assert!(!first.meta.result_from_cache);

    let second = source.routes("192.0.2.1").await.unwrap();
    assert!(second.meta.result_from_cache);
    assert_eq!(second.meta.cached_at, first.meta.cached_at);
    assert_eq!(second.imported, first.imported);
    assert_eq!(backend.rib_requests.load(Ordering::SeqCst), 1);

    // Each neighbor has its own cache entry
    source.routes("192.0.2.2").await.unwrap();
    assert_eq!(backend.rib_requests.load(Ordering::SeqCst), 2);
    assert_eq!(source.expire_caches(), 0);
}

#[tokio::test]
async fn test_disabled_cache_always_refetches() {
    let (backend, api) = spawn_backend().await;
    let source = source(&api, 0);

    for _ in 0..3 {
        let response = source.routes("192.0.2.1").await.unwrap();
        assert!(!response.meta.result_from_cache);
    }
    assert_eq!(backend.rib_requests.load(Ordering::SeqCst), 3);

    source.neighbors_summary().await.unwrap();
    source.neighbors_summary().await.unwrap();
    assert_eq!(backend.neighbors_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_zero_routes_cache_size_keeps_neighbors_cache() {
    let (backend, api) = spawn_backend().await;
    let config = BgplgdConfig {
        api,
        cache_ttl_secs: 300,
        routes_cache_size: 0,
        request_timeout_secs: 5,
        ..Default::default()
    };
    let source = BgplgdSource::new("rs1", config).unwrap();

    source.routes("192.0.2.1").await.unwrap();
    let again = source.routes("192.0.2.1").await.unwrap();
    assert!(!again.meta.result_from_cache);
    assert_eq!(backend.rib_requests.load(Ordering::SeqCst), 2);

    source.neighbors_summary().await.unwrap();
    let summary = source.neighbors_summary().await.unwrap();
    assert!(summary.meta.result_from_cache);
    assert_eq!(backend.neighbors_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let (backend, api) = spawn_backend().await;
    let source = source(&api, 300);

    backend.mode.store(MODE_ERROR, Ordering::SeqCst);
    let err = source.routes("192.0.2.1").await.unwrap_err();
    assert!(matches!(err, SourceError::BackendStatus { .. }));
    assert!(err.is_retryable());

    backend.mode.store(MODE_OK, Ordering::SeqCst);
    let response = source.routes("192.0.2.1").await.unwrap();
    assert!(!response.meta.result_from_cache);
    assert_eq!(backend.rib_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_malformed_body_is_decode_failure() {
    let (backend, api) = spawn_backend().await;
    let source = source(&api, 300);

    backend.mode.store(MODE_MALFORMED, Ordering::SeqCst);
    assert!(matches!(
        source.neighbors_summary().await,
        Err(SourceError::DecodeFailed(_))
    ));
    assert!(matches!(
        source.all_routes().await,
        Err(SourceError::DecodeFailed(_))
    ));
}

#[tokio::test]
async fn test_all_routes_are_classified() {
    let (_backend, api) = spawn_backend().await;
    let source = source(&api, 300);

    let response = source.all_routes().await.unwrap();
    assert_eq!(response.imported.len(), 1);
    assert_eq!(response.filtered.len(), 1);
    assert_eq!(response.total(), 2);
}

#[tokio::test]
async fn test_unsupported_queries() {
    let (_backend, api) = spawn_backend().await;
    let source = source(&api, 300);

    let not_exported = source.routes_not_exported("192.0.2.1").await.unwrap();
    assert_eq!(not_exported.total(), 0);

    assert!(matches!(
        source.lookup_prefix("198.51.100.0/24").await,
        Err(SourceError::NotImplemented(_))
    ));

    let status = source.status().await.unwrap();
    assert_eq!(status.status.backend, "bgplgd");
}

#[tokio::test]
async fn test_unreachable_backend() {
    let source = source("http://127.0.0.1:1/api", 300);
    let err = source.neighbors_summary().await.unwrap_err();
    assert_eq!(err.kind(), "backend_unreachable");
}
