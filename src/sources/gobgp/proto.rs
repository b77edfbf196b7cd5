//! Protobuf messages of the GoBGP API.
//!
//! Hand-written prost messages for the subset of `gobgpapi` this source
//! uses, so no proto files or build-time codegen are needed. Field tags
//! follow GoBGP's `gobgp.proto` and `attribute.proto`; unknown fields are
//! skipped on decode.

use prost_types::{Any, Timestamp};

pub const GET_BGP_PATH: &str = "/gobgpapi.GobgpApi/GetBgp";
pub const LIST_PEER_PATH: &str = "/gobgpapi.GobgpApi/ListPeer";
pub const LIST_PATH_PATH: &str = "/gobgpapi.GobgpApi/ListPath";

// ============================================================================
// Global
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetBgpRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetBgpResponse {
    #[prost(message, optional, tag = "1")]
    pub global: Option<Global>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Global {
    #[prost(uint32, tag = "1")]
    pub asn: u32,
    #[prost(string, tag = "2")]
    pub router_id: String,
    #[prost(int32, tag = "3")]
    pub listen_port: i32,
}

// ============================================================================
// Peers
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListPeerRequest {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(bool, tag = "2")]
    pub enable_advertised: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListPeerResponse {
    #[prost(message, optional, tag = "1")]
    pub peer: Option<Peer>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Peer {
    #[prost(message, optional, tag = "2")]
    pub conf: Option<PeerConf>,
    #[prost(message, optional, tag = "5")]
    pub state: Option<PeerState>,
    #[prost(message, optional, tag = "6")]
    pub timers: Option<Timers>,
    #[prost(message, repeated, tag = "10")]
    pub afi_safis: Vec<AfiSafi>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PeerConf {
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(uint32, tag = "3")]
    pub local_asn: u32,
    #[prost(string, tag = "4")]
    pub neighbor_address: String,
    #[prost(uint32, tag = "5")]
    pub peer_asn: u32,
    #[prost(string, tag = "12")]
    pub vrf: String,
    #[prost(bool, tag = "15")]
    pub admin_down: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum SessionState {
    Unknown = 0,
    Idle = 1,
    Connect = 2,
    Active = 3,
    Opensent = 4,
    Openconfirm = 5,
    Established = 6,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PeerState {
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(uint32, tag = "3")]
    pub local_asn: u32,
    #[prost(string, tag = "5")]
    pub neighbor_address: String,
    #[prost(uint32, tag = "6")]
    pub peer_asn: u32,
    #[prost(enumeration = "SessionState", tag = "13")]
    pub session_state: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Timers {
    #[prost(message, optional, tag = "2")]
    pub state: Option<TimersState>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TimersState {
    #[prost(message, optional, tag = "6")]
    pub uptime: Option<Timestamp>,
    #[prost(message, optional, tag = "7")]
    pub downtime: Option<Timestamp>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AfiSafi {
    #[prost(message, optional, tag = "3")]
    pub state: Option<AfiSafiState>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AfiSafiState {
    #[prost(message, optional, tag = "1")]
    pub family: Option<Family>,
    #[prost(bool, tag = "2")]
    pub enabled: bool,
    #[prost(uint64, tag = "3")]
    pub received: u64,
    #[prost(uint64, tag = "4")]
    pub accepted: u64,
    #[prost(uint64, tag = "5")]
    pub advertised: u64,
}

// ============================================================================
// Families and tables
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Afi {
    Unknown = 0,
    Ip = 1,
    Ip6 = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Safi {
    Unknown = 0,
    Unicast = 1,
    Multicast = 2,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Family {
    #[prost(enumeration = "Afi", tag = "1")]
    pub afi: i32,
    #[prost(enumeration = "Safi", tag = "2")]
    pub safi: i32,
}

impl Family {
    pub fn ipv4_unicast() -> Self {
        Family {
            afi: Afi::Ip as i32,
            safi: Safi::Unicast as i32,
        }
    }

    pub fn ipv6_unicast() -> Self {
        Family {
            afi: Afi::Ip6 as i32,
            safi: Safi::Unicast as i32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum TableType {
    Global = 0,
    Local = 1,
    AdjIn = 2,
    AdjOut = 3,
    Vrf = 4,
}

// ============================================================================
// Paths
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListPathRequest {
    #[prost(enumeration = "TableType", tag = "1")]
    pub table_type: i32,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, optional, tag = "3")]
    pub family: Option<Family>,
    #[prost(bool, tag = "6")]
    pub enable_filtered: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListPathResponse {
    #[prost(message, optional, tag = "1")]
    pub destination: Option<Destination>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Destination {
    #[prost(string, tag = "1")]
    pub prefix: String,
    #[prost(message, repeated, tag = "2")]
    pub paths: Vec<Path>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Path {
    #[prost(message, optional, tag = "1")]
    pub nlri: Option<Any>,
    #[prost(message, repeated, tag = "2")]
    pub pattrs: Vec<Any>,
    #[prost(message, optional, tag = "3")]
    pub age: Option<Timestamp>,
    #[prost(bool, tag = "4")]
    pub best: bool,
    #[prost(bool, tag = "5")]
    pub is_withdraw: bool,
    #[prost(message, optional, tag = "9")]
    pub family: Option<Family>,
    #[prost(uint32, tag = "10")]
    pub source_asn: u32,
    #[prost(string, tag = "11")]
    pub source_id: String,
    #[prost(bool, tag = "12")]
    pub filtered: bool,
    #[prost(string, tag = "15")]
    pub neighbor_ip: String,
}

// ============================================================================
// Path attributes (carried as google.protobuf.Any)
// ============================================================================

pub const ORIGIN_ATTRIBUTE: &str = "gobgpapi.OriginAttribute";
pub const AS_PATH_ATTRIBUTE: &str = "gobgpapi.AsPathAttribute";
pub const NEXT_HOP_ATTRIBUTE: &str = "gobgpapi.NextHopAttribute";
pub const MED_ATTRIBUTE: &str = "gobgpapi.MultiExitDiscAttribute";
pub const LOCAL_PREF_ATTRIBUTE: &str = "gobgpapi.LocalPrefAttribute";
pub const COMMUNITIES_ATTRIBUTE: &str = "gobgpapi.CommunitiesAttribute";
pub const LARGE_COMMUNITIES_ATTRIBUTE: &str = "gobgpapi.LargeCommunitiesAttribute";
pub const MP_REACH_ATTRIBUTE: &str = "gobgpapi.MpReachNLRIAttribute";

/// Fully qualified `Any` type URL for a message name
pub fn type_url(name: &str) -> String {
    format!("type.googleapis.com/{}", name)
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct OriginAttribute {
    #[prost(uint32, tag = "1")]
    pub origin: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AsSegment {
    #[prost(uint32, tag = "1")]
    pub r#type: u32,
    #[prost(uint32, repeated, tag = "2")]
    pub numbers: Vec<u32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AsPathAttribute {
    #[prost(message, repeated, tag = "1")]
    pub segments: Vec<AsSegment>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NextHopAttribute {
    #[prost(string, tag = "1")]
    pub next_hop: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MultiExitDiscAttribute {
    #[prost(uint32, tag = "1")]
    pub med: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LocalPrefAttribute {
    #[prost(uint32, tag = "1")]
    pub local_pref: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CommunitiesAttribute {
    #[prost(uint32, repeated, tag = "1")]
    pub communities: Vec<u32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LargeCommunity {
    #[prost(uint32, tag = "1")]
    pub global_admin: u32,
    #[prost(uint32, tag = "2")]
    pub local_data1: u32,
    #[prost(uint32, tag = "3")]
    pub local_data2: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LargeCommunitiesAttribute {
    #[prost(message, repeated, tag = "1")]
    pub communities: Vec<LargeCommunity>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MpReachNlriAttribute {
    #[prost(message, optional, tag = "1")]
    pub family: Option<Family>,
    #[prost(string, repeated, tag = "2")]
    pub next_hops: Vec<String>,
}

/// Pack a message into an `Any` with its GoBGP type URL
pub fn pack<M: prost::Message>(name: &str, message: &M) -> Any {
    Any {
        type_url: type_url(name),
        value: message.encode_to_vec(),
    }
}
