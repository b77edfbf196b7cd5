use super::meta::Meta;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Standard BGP community `asn:value`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Community(pub u32, pub u32);

impl Community {
    /// Split the 32-bit wire encoding into its two halves
    pub fn from_u32(raw: u32) -> Self {
        Community(raw >> 16, raw & 0xffff)
    }
}

/// BGP large community `global:local1:local2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LargeCommunity(pub u32, pub u32, pub u32);

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

impl fmt::Display for LargeCommunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.0, self.1, self.2)
    }
}

fn parse_parts<const N: usize>(s: &str) -> Result<[u32; N], String> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != N {
        return Err(format!("expected {} components in community '{}'", N, s));
    }
    let mut out = [0u32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("invalid community component '{}' in '{}'", part, s))?;
    }
    Ok(out)
}

impl FromStr for Community {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [asn, value] = parse_parts::<2>(s)?;
        Ok(Community(asn, value))
    }
}

impl FromStr for LargeCommunity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [global, local1, local2] = parse_parts::<3>(s)?;
        Ok(LargeCommunity(global, local1, local2))
    }
}

/// BGP path attributes of a route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BgpInfo {
    pub origin: String,
    pub as_path: Vec<u32>,
    pub next_hop: String,
    pub communities: Vec<Community>,
    pub large_communities: Vec<LargeCommunity>,
    pub ext_communities: Vec<String>,
    pub local_pref: u32,
    pub med: u32,
}

/// A single RIB entry as learnt from one neighbor
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub neighbor_id: String,
    pub network: String,
    pub gateway: String,
    pub metric: u32,
    pub bgp: BgpInfo,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub age: Duration,
    pub primary: bool,
}

impl Route {
    pub fn has_large_community(&self, community: &LargeCommunity) -> bool {
        self.bgp.large_communities.contains(community)
    }
}

/// Routes of one neighbor (or of the whole RIB), split into disjoint sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutesResponse {
    pub meta: Meta,
    pub imported: Vec<Route>,
    pub not_exported: Vec<Route>,
    pub filtered: Vec<Route>,
}

impl RoutesResponse {
    pub fn empty(meta: Meta) -> Self {
        Self {
            meta,
            imported: Vec::new(),
            not_exported: Vec::new(),
            filtered: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.imported.len() + self.not_exported.len() + self.filtered.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutesLookupResponse {
    pub meta: Meta,
    pub routes: Vec<Route>,
}
