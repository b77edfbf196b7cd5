//! Configuration system
//!
//! TOML documents with embedded defaults (see `config_struct!`). The loaded
//! configuration is owned by the process and read-only to every source.

#[macro_use]
mod macros;
mod schemas;
mod utils;

pub use schemas::{BackendKind, BgplgdConfig, Config, GobgpConfig, SourceConfig};
