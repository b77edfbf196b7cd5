/// Peer records to neighbors
///
/// GoBGP has no neighbor id of its own, so one is derived from the peer's
/// configuration: SHA-256 over `address|peer_asn|local_asn|vrf`, hex encoded
/// and cut to 32 characters. The id is stable across sessions and restarts as
/// long as the peer configuration does not change.
use super::proto::{Peer, SessionState};
use crate::api::{Neighbor, NeighborState, NeighborStatus};
use chrono::{DateTime, TimeZone, Utc};
use prost_types::Timestamp;
use sha2::{Digest, Sha256};
use std::time::Duration;

const PEER_HASH_LEN: usize = 32;

/// Neighbor address, preferring the live state over the configuration
pub fn peer_address(peer: &Peer) -> String {
    match (&peer.state, &peer.conf) {
        (Some(state), _) if !state.neighbor_address.is_empty() => state.neighbor_address.clone(),
        (_, Some(conf)) => conf.neighbor_address.clone(),
        _ => String::new(),
    }
}

fn peer_asn(peer: &Peer) -> u32 {
    match (&peer.state, &peer.conf) {
        (Some(state), _) if state.peer_asn != 0 => state.peer_asn,
        (_, Some(conf)) => conf.peer_asn,
        _ => 0,
    }
}

pub fn peer_hash(peer: &Peer) -> String {
    let (local_asn, vrf) = match &peer.conf {
        Some(conf) => (conf.local_asn, conf.vrf.as_str()),
        None => (0, ""),
    };

    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "{}|{}|{}|{}",
            peer_address(peer),
            peer_asn(peer),
            local_asn,
            vrf
        )
        .as_bytes(),
    );
    let mut hash = format!("{:x}", hasher.finalize());
    hash.truncate(PEER_HASH_LEN);
    hash
}

pub fn session_state(peer: &Peer) -> NeighborState {
    let state = peer
        .state
        .as_ref()
        .and_then(|s| SessionState::try_from(s.session_state).ok());

    match state {
        Some(SessionState::Established) => NeighborState::Up,
        _ => NeighborState::Down,
    }
}

/// Time elapsed since `ts`, zero for timestamps in the future
fn elapsed_since(ts: &Timestamp, now: DateTime<Utc>) -> Duration {
    let nanos = u32::try_from(ts.nanos).unwrap_or(0);
    match Utc.timestamp_opt(ts.seconds, nanos).single() {
        Some(at) => (now - at).to_std().unwrap_or(Duration::ZERO),
        None => Duration::ZERO,
    }
}

/// Session uptime, zero unless the session is established
pub fn uptime(peer: &Peer, now: DateTime<Utc>) -> Duration {
    if session_state(peer) != NeighborState::Up {
        return Duration::ZERO;
    }

    peer.timers
        .as_ref()
        .and_then(|t| t.state.as_ref())
        .and_then(|s| s.uptime.as_ref())
        .map(|ts| elapsed_since(ts, now))
        .unwrap_or(Duration::ZERO)
}

/// Time spent in the current up or down state
fn since(peer: &Peer, now: DateTime<Utc>) -> Duration {
    let timers = peer.timers.as_ref().and_then(|t| t.state.as_ref());
    let ts = match session_state(peer) {
        NeighborState::Up => timers.and_then(|s| s.uptime.as_ref()),
        NeighborState::Down => timers.and_then(|s| s.downtime.as_ref()),
    };
    ts.map(|ts| elapsed_since(ts, now)).unwrap_or(Duration::ZERO)
}

pub fn neighbor_from_peer(peer: &Peer, route_server_id: &str, now: DateTime<Utc>) -> Neighbor {
    let (mut received, mut accepted, mut exported) = (0u64, 0u64, 0u64);
    for afi_safi in &peer.afi_safis {
        if let Some(state) = &afi_safi.state {
            received = received.saturating_add(state.received);
            accepted = accepted.saturating_add(state.accepted);
            exported = exported.saturating_add(state.advertised);
        }
    }

    let description = peer
        .conf
        .as_ref()
        .map(|c| c.description.clone())
        .filter(|d| !d.is_empty())
        .or_else(|| peer.state.as_ref().map(|s| s.description.clone()))
        .unwrap_or_default();

    Neighbor {
        id: peer_hash(peer),
        address: peer_address(peer),
        asn: peer_asn(peer),
        state: session_state(peer),
        description,
        route_server_id: route_server_id.to_string(),
        routes_received: received,
        routes_accepted: accepted,
        routes_exported: exported,
        routes_filtered: received.saturating_sub(accepted),
        uptime: uptime(peer, now),
    }
}

pub fn status_from_peer(peer: &Peer, now: DateTime<Utc>) -> NeighborStatus {
    NeighborStatus {
        id: peer_hash(peer),
        state: session_state(peer),
        since: since(peer, now),
    }
}
