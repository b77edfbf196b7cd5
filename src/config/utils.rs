/// Configuration utilities - loading and validation
///
/// There is no global configuration instance: the caller loads a `Config`
/// once and hands each source its own `SourceConfig`.
use super::schemas::{BackendKind, Config, SourceConfig};
use crate::classifier::RejectPolicy;
use crate::errors::{SourceError, SourceResult};
use crate::logger::{self, LogTag};
use std::collections::HashSet;
use std::path::Path;

/// Longest accepted cache TTL (one week)
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 3600;

/// Longest accepted request or processing timeout (one hour)
pub const MAX_TIMEOUT_SECS: u64 = 3600;

fn check_bound(field: &str, value: u64, max: u64) -> Result<(), String> {
    if value > max {
        return Err(format!("{} = {} exceeds the maximum of {}", field, value, max));
    }
    Ok(())
}

impl Config {
    /// Load and validate a TOML configuration file
    pub fn load_from_path(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SourceError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml_str(&contents)?;
        logger::info(
            LogTag::Config,
            &format!(
                "Loaded {} route server(s) from {}",
                config.sources.len(),
                path.display()
            ),
        );
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> SourceResult<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SourceResult<()> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !seen.insert(source.id.as_str()) {
                return Err(SourceError::Config(format!(
                    "duplicate route server id '{}'",
                    source.id
                )));
            }
        }
        Ok(())
    }

    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }
}

impl SourceConfig {
    pub fn validate(&self) -> SourceResult<()> {
        if self.id.trim().is_empty() {
            return Err(SourceError::Config("route server without id".to_string()));
        }

        let invalid = |reason: String| {
            SourceError::Config(format!("route server '{}': {}", self.id, reason))
        };

        match self.backend() {
            None => {
                return Err(invalid(
                    "exactly one of [bgplgd] or [gobgp] must be configured".to_string(),
                ))
            }
            Some(BackendKind::Bgplgd) => {
                if let Some(cfg) = &self.bgplgd {
                    url::Url::parse(&cfg.api)
                        .map_err(|e| invalid(format!("invalid api url '{}': {}", cfg.api, e)))?;
                    check_bound("cache_ttl_secs", cfg.cache_ttl_secs, MAX_CACHE_TTL_SECS)
                        .map_err(invalid)?;
                    check_bound(
                        "request_timeout_secs",
                        cfg.request_timeout_secs,
                        MAX_TIMEOUT_SECS,
                    )
                    .map_err(invalid)?;
                    RejectPolicy::parse(&cfg.reject_communities).map_err(invalid)?;
                }
            }
            Some(BackendKind::Gobgp) => {
                if let Some(cfg) = &self.gobgp {
                    if cfg.host.is_empty() {
                        return Err(invalid("gobgp host is empty".to_string()));
                    }
                    if cfg.insecure && !cfg.tls_crt.is_empty() {
                        return Err(invalid(
                            "insecure and tls_crt are mutually exclusive".to_string(),
                        ));
                    }
                    if !cfg.insecure && (cfg.tls_crt.is_empty() || cfg.tls_common_name.is_empty())
                    {
                        return Err(invalid(
                            "tls_crt and tls_common_name are required unless insecure".to_string(),
                        ));
                    }
                    check_bound("cache_ttl_secs", cfg.cache_ttl_secs, MAX_CACHE_TTL_SECS)
                        .map_err(invalid)?;
                    check_bound(
                        "processing_timeout_secs",
                        cfg.processing_timeout_secs,
                        MAX_TIMEOUT_SECS,
                    )
                    .map_err(invalid)?;
                    RejectPolicy::parse(&cfg.reject_communities).map_err(invalid)?;
                }
            }
        }
        Ok(())
    }
}
