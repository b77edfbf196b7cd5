/// HTTP client for the bgplgd API
///
/// One `reqwest::Client` per source, reused for every request. Each logical
/// query is exactly one GET; non-success statuses and transport failures are
/// returned as errors without retrying.
use crate::config::BgplgdConfig;
use crate::errors::{SourceError, SourceResult};
use crate::logger::{self, LogTag};
use reqwest::Client;
use std::time::{Duration, Instant};

pub const NEIGHBORS_PATH: &str = "/neighbors";
pub const SUMMARY_PATH: &str = "/summary";
pub const RIB_PATH: &str = "/rib";

pub struct BgplgdClient {
    client: Client,
    config: BgplgdConfig,
    timeout: Duration,
}

impl BgplgdClient {
    pub fn new(config: BgplgdConfig) -> SourceResult<Self> {
        let timeout = config.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    /// All neighbors with their prefix counters
    pub async fn show_neighbors(&self) -> SourceResult<Vec<u8>> {
        self.get(NEIGHBORS_PATH, None).await
    }

    /// Session summary of all neighbors
    pub async fn show_summary(&self) -> SourceResult<Vec<u8>> {
        self.get(SUMMARY_PATH, None).await
    }

    /// Routes learnt from one neighbor
    pub async fn show_neighbor_rib(&self, neighbor_id: &str) -> SourceResult<Vec<u8>> {
        self.get(RIB_PATH, Some(("neighbor", neighbor_id))).await
    }

    /// Routes learnt from all neighbors
    pub async fn show_rib(&self) -> SourceResult<Vec<u8>> {
        self.get(RIB_PATH, None).await
    }

    async fn get(&self, path: &str, query: Option<(&str, &str)>) -> SourceResult<Vec<u8>> {
        let url = self.config.api_url(path);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json");
        if let Some(query) = query {
            request = request.query(&[query]);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| self.map_error(&url, e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            logger::warning(
                LogTag::Bgplgd,
                &format!("GET {} answered HTTP {}", url, status),
            );
            return Err(SourceError::BackendStatus {
                endpoint: url,
                status: status.to_string(),
                message: body,
            });
        }

        let body = response.bytes().await.map_err(|e| self.map_error(&url, e))?;
        logger::debug(
            LogTag::Bgplgd,
            &format!(
                "GET {} -> {} bytes in {}ms",
                url,
                body.len(),
                start.elapsed().as_millis()
            ),
        );
        Ok(body.to_vec())
    }

    fn map_error(&self, url: &str, err: reqwest::Error) -> SourceError {
        logger::warning(LogTag::Bgplgd, &format!("GET {} failed: {}", url, err));
        if err.is_timeout() {
            SourceError::timeout(format!("GET {}", url), self.timeout)
        } else {
            SourceError::from(err)
        }
    }
}
