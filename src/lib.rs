//! Route-server sources for a BGP looking glass
//!
//! Each configured route server is exposed as a [`sources::Source`]: a uniform
//! async query surface for status, neighbors and routes, backed either by
//! OpenBGPD's bgplgd HTTP API or by GoBGP's gRPC API. Responses carry a cache
//! envelope ([`api::Meta`]) and routes are split into imported, filtered and
//! not-exported sets by the route server's reject communities.

pub mod api;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod logger;
pub mod sources;

pub use errors::{SourceError, SourceResult};
pub use sources::{build_source, Source, SourceRegistry};
