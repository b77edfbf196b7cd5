/// Error handling for route-server sources
///
/// Every backend- or decode-level failure is returned as a `SourceError`,
/// never as a panic. Nothing in this crate retries; `is_retryable` only tells an
/// external poller whether re-invoking the source later makes sense.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Backend unreachable: {endpoint}: {reason}")] BackendUnreachable {
        endpoint: String,
        reason: String,
    },

    #[error("Backend timeout: {operation} exceeded {timeout_secs}s")] BackendTimeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("Backend status error: {endpoint} answered {status}: {message}")] BackendStatus {
        endpoint: String,
        status: String,
        message: String,
    },

    #[error("Decode failed: {0}")] DecodeFailed(String),

    #[error("Not implemented: {0}")] NotImplemented(String),

    #[error("Not found: {0}")] NotFound(String),

    #[error("Configuration error: {0}")] Config(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

impl SourceError {
    pub fn unreachable(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        SourceError::BackendUnreachable {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout: std::time::Duration) -> Self {
        SourceError::BackendTimeout {
            operation: operation.into(),
            timeout_secs: timeout.as_secs(),
        }
    }

    pub fn neighbor_not_found(neighbor_id: &str) -> Self {
        SourceError::NotFound(format!("neighbor {}", neighbor_id))
    }

    /// Transport and deadline failures may succeed on a later poll.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::BackendUnreachable { .. } => true,
            SourceError::BackendTimeout { .. } => true,
            SourceError::BackendStatus { .. } => true,
            _ => false,
        }
    }

    /// Short machine-readable kind, used as a log field and by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::BackendUnreachable { .. } => "backend_unreachable",
            SourceError::BackendTimeout { .. } => "backend_timeout",
            SourceError::BackendStatus { .. } => "backend_status",
            SourceError::DecodeFailed(_) => "decode_failed",
            SourceError::NotImplemented(_) => "not_implemented",
            SourceError::NotFound(_) => "not_found",
            SourceError::Config(_) => "config",
        }
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::DecodeFailed(err.to_string())
    }
}

impl From<prost::DecodeError> for SourceError {
    fn from(err: prost::DecodeError) -> Self {
        SourceError::DecodeFailed(err.to_string())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if err.is_timeout() {
            SourceError::BackendTimeout {
                operation: format!("GET {}", endpoint),
                timeout_secs: 0,
            }
        } else if err.is_decode() {
            SourceError::DecodeFailed(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::BackendStatus {
                endpoint,
                status: status.to_string(),
                message: err.to_string(),
            }
        } else {
            SourceError::BackendUnreachable {
                endpoint,
                reason: err.to_string(),
            }
        }
    }
}

impl From<tonic::Status> for SourceError {
    fn from(status: tonic::Status) -> Self {
        use tonic::Code;

        match status.code() {
            Code::DeadlineExceeded => SourceError::BackendTimeout {
                operation: "rpc".to_string(),
                timeout_secs: 0,
            },
            Code::Unavailable => SourceError::BackendUnreachable {
                endpoint: "rpc".to_string(),
                reason: status.message().to_string(),
            },
            Code::Unimplemented => SourceError::NotImplemented(status.message().to_string()),
            Code::NotFound => SourceError::NotFound(status.message().to_string()),
            code => SourceError::BackendStatus {
                endpoint: "rpc".to_string(),
                status: format!("{:?}", code),
                message: status.message().to_string(),
            },
        }
    }
}

impl From<tonic::transport::Error> for SourceError {
    fn from(err: tonic::transport::Error) -> Self {
        SourceError::BackendUnreachable {
            endpoint: "rpc".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<tokio::time::error::Elapsed> for SourceError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        SourceError::BackendTimeout {
            operation: "request".to_string(),
            timeout_secs: 0,
        }
    }
}

impl From<toml::de::Error> for SourceError {
    fn from(err: toml::de::Error) -> Self {
        SourceError::Config(err.to_string())
    }
}
