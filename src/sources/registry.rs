/// Source registry
///
/// Owns one `Source` per configured route server, in configuration order,
/// and runs the periodic cache expiry sweep over all of them.
use super::{build_source, Source};
use crate::config::Config;
use crate::errors::{SourceError, SourceResult};
use crate::logger::{self, LogTag};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        Self { sources }
    }

    /// Build every configured source; fails on the first invalid one
    pub fn from_config(config: &Config) -> SourceResult<Self> {
        config.validate()?;

        let mut sources = Vec::with_capacity(config.sources.len());
        for source_config in &config.sources {
            let source = build_source(source_config)?;
            logger::info(
                LogTag::Registry,
                &format!(
                    "Registered route server {} ({:?})",
                    source_config.display_name(),
                    source.backend()
                ),
            );
            sources.push(source);
        }

        Ok(Self { sources })
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Source>> {
        self.sources.iter().find(|s| s.id() == id).cloned()
    }

    /// Like `get`, with `NotFound` for unknown ids
    pub fn require(&self, id: &str) -> SourceResult<Arc<dyn Source>> {
        self.get(id)
            .ok_or_else(|| SourceError::NotFound(format!("route server {}", id)))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Sweep expired entries from the caches of all sources
    pub fn expire_caches(&self) -> usize {
        let count: usize = self.sources.iter().map(|s| s.expire_caches()).sum();
        if count > 0 {
            logger::debug(
                LogTag::Cache,
                &format!("Expired {} cache entries", count),
            );
        }
        count
    }

    /// Run `expire_caches` every `period` until the returned task is aborted
    pub fn spawn_cache_expiry(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            logger::info(
                LogTag::Cache,
                &format!("Starting cache expiry every {}s", period.as_secs()),
            );
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.expire_caches();
            }
        })
    }
}
