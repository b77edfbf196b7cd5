//! Domain model shared by every source
//!
//! Responses serialize to JSON for the layers above; durations are seconds.

pub mod meta;
pub mod neighbors;
pub mod routes;

pub use meta::{Envelope, Meta};
pub use neighbors::{
    Neighbor, NeighborState, NeighborStatus, NeighborsResponse, NeighborsStatusResponse, Status,
    StatusResponse,
};
pub use routes::{
    BgpInfo, Community, LargeCommunity, Route, RoutesLookupResponse, RoutesResponse,
};
