/// Decoding of bgplgd JSON documents
///
/// bgplgd serves the JSON output of `bgpctl -j`. Numbers are sometimes
/// rendered as strings (`remote_as`), so numeric fields accept both.
/// A document that does not match these shapes is a `DecodeFailed` error.
use crate::api::{BgpInfo, Community, LargeCommunity, Neighbor, NeighborState, NeighborStatus, Route};
use crate::errors::{SourceError, SourceResult};
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use std::time::Duration;

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NeighborsDocument {
    #[serde(default)]
    pub neighbors: Vec<NeighborRecord>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct NeighborRecord {
    pub remote_addr: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub remote_as: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub last_updown: String,
    #[serde(default)]
    pub stats: NeighborStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct NeighborStats {
    #[serde(default)]
    pub prefixes: PrefixStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct PrefixStats {
    #[serde(default)]
    pub sent: u64,
    #[serde(default)]
    pub received: u64,
}

#[derive(Debug, Deserialize)]
pub struct RibDocument {
    #[serde(default)]
    pub rib: Vec<RibEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RibNeighbor {
    pub remote_addr: String,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct RibEntry {
    pub prefix: String,
    #[serde(default)]
    pub aspath: String,
    #[serde(default)]
    pub exit_nexthop: String,
    pub neighbor: RibNeighbor,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub metric: u32,
    #[serde(default)]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub localpref: u32,
    #[serde(default)]
    pub last_update_sec: u64,
    #[serde(default)]
    pub best: bool,
    #[serde(default)]
    pub communities: Vec<String>,
    #[serde(default)]
    pub large_communities: Vec<String>,
    #[serde(default)]
    pub extended_communities: Vec<String>,
}

// ============================================================================
// DOMAIN CONVERSION
// ============================================================================

/// Only an established session counts as up
pub fn decode_state(state: &str) -> NeighborState {
    if state.eq_ignore_ascii_case("established") {
        NeighborState::Up
    } else {
        NeighborState::Down
    }
}

/// Parse bgpctl's `last_updown` rendering
///
/// Accepted forms: `Never`, `HH:MM:SS`, and unit sequences such as
/// `1d02h03m` or `02w3d04h`.
pub fn decode_updown(value: &str) -> SourceResult<Duration> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("never") {
        return Ok(Duration::ZERO);
    }

    let invalid = || SourceError::DecodeFailed(format!("invalid duration '{}'", value));

    if value.contains(':') {
        let fields: Vec<&str> = value.split(':').collect();
        if !(2..=3).contains(&fields.len()) {
            return Err(invalid());
        }
        let mut secs = 0u64;
        for part in fields {
            let n: u64 = part.parse().map_err(|_| invalid())?;
            secs = secs
                .checked_mul(60)
                .and_then(|s| s.checked_add(n))
                .ok_or_else(invalid)?;
        }
        return Ok(Duration::from_secs(secs));
    }

    let mut secs = 0u64;
    let mut digits = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            'w' => 7 * 86_400,
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid()),
        };
        let n: u64 = digits.parse().map_err(|_| invalid())?;
        secs = n
            .checked_mul(unit)
            .and_then(|n| secs.checked_add(n))
            .ok_or_else(invalid)?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(invalid());
    }
    Ok(Duration::from_secs(secs))
}

/// AS path as rendered by bgpctl, AS-set braces are flattened
pub fn decode_as_path(aspath: &str) -> Vec<u32> {
    aspath
        .split(|c: char| c.is_whitespace() || c == '{' || c == '}' || c == ',')
        .filter_map(|token| token.parse().ok())
        .collect()
}

fn decode_neighbor(record: NeighborRecord) -> SourceResult<Neighbor> {
    let state = decode_state(&record.state);
    let uptime = match state {
        NeighborState::Up => decode_updown(&record.last_updown)?,
        NeighborState::Down => Duration::ZERO,
    };
    let received = record.stats.prefixes.received;

    Ok(Neighbor {
        id: record.remote_addr.clone(),
        address: record.remote_addr,
        asn: record.remote_as,
        state,
        description: record.description,
        route_server_id: String::new(),
        routes_received: received,
        routes_accepted: received,
        routes_exported: record.stats.prefixes.sent,
        routes_filtered: 0,
        uptime,
    })
}

fn decode_neighbor_status(record: NeighborRecord) -> SourceResult<NeighborStatus> {
    Ok(NeighborStatus {
        since: decode_updown(&record.last_updown)?,
        state: decode_state(&record.state),
        id: record.remote_addr,
    })
}

fn decode_route(entry: RibEntry) -> SourceResult<Route> {
    let communities = entry
        .communities
        .iter()
        .map(|c| c.parse::<Community>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(SourceError::DecodeFailed)?;
    let large_communities = entry
        .large_communities
        .iter()
        .map(|c| c.parse::<LargeCommunity>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(SourceError::DecodeFailed)?;

    Ok(Route {
        id: entry.prefix.clone(),
        neighbor_id: entry.neighbor.remote_addr,
        network: entry.prefix,
        gateway: entry.exit_nexthop.clone(),
        metric: entry.metric,
        bgp: BgpInfo {
            origin: entry.origin,
            as_path: decode_as_path(&entry.aspath),
            next_hop: entry.exit_nexthop,
            communities,
            large_communities,
            ext_communities: entry.extended_communities,
            local_pref: entry.localpref,
            med: entry.metric,
        },
        age: Duration::from_secs(entry.last_update_sec),
        primary: entry.best,
    })
}

pub fn decode_neighbors(body: &[u8]) -> SourceResult<Vec<Neighbor>> {
    let document: NeighborsDocument = serde_json::from_slice(body)?;
    document.neighbors.into_iter().map(decode_neighbor).collect()
}

pub fn decode_neighbors_status(body: &[u8]) -> SourceResult<Vec<NeighborStatus>> {
    let document: NeighborsDocument = serde_json::from_slice(body)?;
    document
        .neighbors
        .into_iter()
        .map(decode_neighbor_status)
        .collect()
}

pub fn decode_routes(body: &[u8]) -> SourceResult<Vec<Route>> {
    let document: RibDocument = serde_json::from_slice(body)?;
    document.rib.into_iter().map(decode_route).collect()
}
