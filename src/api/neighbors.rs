use super::meta::Meta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::time::Duration;

/// Two-valued BGP session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborState {
    Up,
    Down,
}

impl NeighborState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeighborState::Up => "up",
            NeighborState::Down => "down",
        }
    }
}

impl std::fmt::Display for NeighborState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A BGP peer of a route server
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub address: String,
    pub asn: u32,
    pub state: NeighborState,
    pub description: String,
    /// Owning route server, stamped by the source
    pub route_server_id: String,
    pub routes_received: u64,
    pub routes_accepted: u64,
    pub routes_exported: u64,
    pub routes_filtered: u64,
    /// Time since the session was established, zero if unknown
    #[serde_as(as = "DurationSeconds<u64>")]
    pub uptime: Duration,
}

/// Lightweight session view of a neighbor
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborStatus {
    pub id: String,
    pub state: NeighborState,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub since: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborsResponse {
    pub meta: Meta,
    pub neighbors: Vec<Neighbor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborsStatusResponse {
    pub meta: Meta,
    pub neighbors: Vec<NeighborStatus>,
}

/// Route server process status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub server_time: DateTime<Utc>,
    pub router_id: String,
    pub version: String,
    pub message: String,
    pub backend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub meta: Meta,
    pub status: Status,
}
