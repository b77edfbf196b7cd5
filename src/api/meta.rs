/// Response envelope metadata
///
/// Every data-bearing response carries a `Meta`, stamped once when the
/// response is built. A cached response keeps its original `cached_at` and
/// `ttl`; only `result_from_cache` flips when it is served again.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub cached_at: DateTime<Utc>,
    /// Absolute point in time after which the response is stale
    pub ttl: DateTime<Utc>,
    /// Version of the source adapter that produced the response
    pub version: String,
    pub result_from_cache: bool,
}

impl Meta {
    pub fn new(version: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            cached_at: now,
            ttl,
            version: version.to_string(),
            result_from_cache: false,
        }
    }
}

/// Access to the envelope of a response
pub trait Envelope {
    fn meta(&self) -> &Meta;
    fn meta_mut(&mut self) -> &mut Meta;

    /// Mark a response taken out of a cache
    fn served_from_cache(mut self) -> Self
    where
        Self: Sized,
    {
        self.meta_mut().result_from_cache = true;
        self
    }
}

macro_rules! impl_envelope {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Envelope for $ty {
                fn meta(&self) -> &Meta {
                    &self.meta
                }

                fn meta_mut(&mut self) -> &mut Meta {
                    &mut self.meta
                }
            }
        )*
    };
}

impl_envelope!(
    super::StatusResponse,
    super::NeighborsResponse,
    super::NeighborsStatusResponse,
    super::RoutesResponse,
    super::RoutesLookupResponse,
);
