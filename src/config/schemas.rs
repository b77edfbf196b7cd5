/// Configuration schemas
///
/// One `SourceConfig` per route server. Exactly one backend block
/// (`bgplgd` or `gobgp`) must be present; the backend is chosen from it once,
/// when the source is built.
use crate::config_struct;
use std::time::Duration;

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    /// Root configuration document
    pub struct Config {
        /// Route servers, in display order
        sources: Vec<SourceConfig> = Vec::new(),
    }
}

config_struct! {
    /// A single route server
    pub struct SourceConfig {
        /// Route server id, stamped onto every neighbor as `route_server_id`
        id: String = String::new(),

        /// Human readable name
        name: String = String::new(),

        /// OpenBGPD bgplgd backend
        bgplgd: Option<BgplgdConfig> = None,

        /// GoBGP gRPC backend
        gobgp: Option<GobgpConfig> = None,
    }
}

/// Backend selected by a `SourceConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Bgplgd,
    Gobgp,
}

impl SourceConfig {
    /// The configured backend, `None` unless exactly one block is present
    pub fn backend(&self) -> Option<BackendKind> {
        match (&self.bgplgd, &self.gobgp) {
            (Some(_), None) => Some(BackendKind::Bgplgd),
            (None, Some(_)) => Some(BackendKind::Gobgp),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

// ============================================================================
// BGPLGD
// ============================================================================

config_struct! {
    /// OpenBGPD bgplgd HTTP backend
    pub struct BgplgdConfig {
        /// Base URL of the bgplgd API, e.g. `http://rs1.example.net/api`
        api: String = String::new(),

        /// Cache TTL in seconds, 0 disables all caches of this source
        cache_ttl_secs: u64 = 300,

        /// Maximum number of neighbors held per routes cache
        routes_cache_size: usize = 1024,

        /// HTTP request timeout in seconds
        request_timeout_secs: u64 = 30,

        /// Large-community patterns marking rejected routes, e.g. `65000:0:*`
        reject_communities: Vec<String> = Vec::new(),
    }
}

impl BgplgdConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Join an API path onto the base URL
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api.trim_end_matches('/'), path)
    }
}

// ============================================================================
// GOBGP
// ============================================================================

config_struct! {
    /// GoBGP gRPC backend
    pub struct GobgpConfig {
        /// gRPC endpoint, `host:port`
        host: String = String::new(),

        /// Plaintext channel; mutually exclusive with `tls_crt`
        insecure: bool = true,

        /// PEM file holding the CA certificate used to verify the server
        tls_crt: String = String::new(),

        /// Expected common name of the server certificate
        tls_common_name: String = String::new(),

        /// Upper bound for a single logical request, in seconds
        processing_timeout_secs: u64 = 300,

        /// Cache TTL in seconds, 0 disables all caches of this source
        cache_ttl_secs: u64 = 300,

        /// Maximum number of neighbors held per routes cache
        routes_cache_size: usize = 128,

        /// Large-community patterns marking rejected routes
        reject_communities: Vec<String> = Vec::new(),
    }
}

impl GobgpConfig {
    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Channel URI with the scheme matching the transport security
    pub fn endpoint_uri(&self) -> String {
        if self.host.contains("://") {
            return self.host.clone();
        }
        let scheme = if self.insecure { "http" } else { "https" };
        format!("{}://{}", scheme, self.host)
    }
}
