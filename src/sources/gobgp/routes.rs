/// Path records to routes
///
/// Path attributes arrive as `google.protobuf.Any`; they are decoded by the
/// message name in their type URL. Attributes this looking glass does not show
/// are skipped, a known attribute with a broken payload fails the path.
use super::proto::{
    AsPathAttribute, CommunitiesAttribute, LargeCommunitiesAttribute, LocalPrefAttribute,
    MpReachNlriAttribute, MultiExitDiscAttribute, NextHopAttribute, OriginAttribute, Path,
    AS_PATH_ATTRIBUTE, COMMUNITIES_ATTRIBUTE, LARGE_COMMUNITIES_ATTRIBUTE, LOCAL_PREF_ATTRIBUTE,
    MED_ATTRIBUTE, MP_REACH_ATTRIBUTE, NEXT_HOP_ATTRIBUTE, ORIGIN_ATTRIBUTE,
};
use crate::api::{BgpInfo, Community, LargeCommunity, Route};
use crate::errors::SourceResult;
use chrono::{DateTime, TimeZone, Utc};
use prost::Message;
use prost_types::Any;
use std::time::Duration;

/// Message name of an `Any`, e.g. `gobgpapi.OriginAttribute`
fn message_name(any: &Any) -> &str {
    any.type_url
        .rsplit_once('/')
        .map(|(_, name)| name)
        .unwrap_or(any.type_url.as_str())
}

pub fn decode_origin(origin: u32) -> String {
    match origin {
        0 => "IGP",
        1 => "EGP",
        2 => "INCOMPLETE",
        _ => "?",
    }
    .to_string()
}

pub fn decode_bgp_info(pattrs: &[Any]) -> SourceResult<BgpInfo> {
    let mut bgp = BgpInfo::default();

    for any in pattrs {
        let value = any.value.as_slice();
        match message_name(any) {
            ORIGIN_ATTRIBUTE => {
                bgp.origin = decode_origin(OriginAttribute::decode(value)?.origin);
            }
            AS_PATH_ATTRIBUTE => {
                let attr = AsPathAttribute::decode(value)?;
                bgp.as_path = attr
                    .segments
                    .into_iter()
                    .flat_map(|segment| segment.numbers)
                    .collect();
            }
            NEXT_HOP_ATTRIBUTE => {
                bgp.next_hop = NextHopAttribute::decode(value)?.next_hop;
            }
            MP_REACH_ATTRIBUTE => {
                // IPv6 next hops only come with the MP_REACH_NLRI attribute
                let attr = MpReachNlriAttribute::decode(value)?;
                if bgp.next_hop.is_empty() {
                    if let Some(next_hop) = attr.next_hops.into_iter().next() {
                        bgp.next_hop = next_hop;
                    }
                }
            }
            MED_ATTRIBUTE => {
                bgp.med = MultiExitDiscAttribute::decode(value)?.med;
            }
            LOCAL_PREF_ATTRIBUTE => {
                bgp.local_pref = LocalPrefAttribute::decode(value)?.local_pref;
            }
            COMMUNITIES_ATTRIBUTE => {
                bgp.communities = CommunitiesAttribute::decode(value)?
                    .communities
                    .into_iter()
                    .map(Community::from_u32)
                    .collect();
            }
            LARGE_COMMUNITIES_ATTRIBUTE => {
                bgp.large_communities = LargeCommunitiesAttribute::decode(value)?
                    .communities
                    .into_iter()
                    .map(|c| LargeCommunity(c.global_admin, c.local_data1, c.local_data2))
                    .collect();
            }
            _ => {}
        }
    }

    Ok(bgp)
}

fn path_age(path: &Path, now: DateTime<Utc>) -> Duration {
    path.age
        .as_ref()
        .and_then(|ts| {
            let nanos = u32::try_from(ts.nanos).unwrap_or(0);
            Utc.timestamp_opt(ts.seconds, nanos).single()
        })
        .and_then(|at| (now - at).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

/// Build the route for one path of destination `prefix`
///
/// `neighbor_id` is the hashed id of the peer the path was learnt from.
pub fn route_from_path(
    prefix: &str,
    path: &Path,
    neighbor_id: &str,
    now: DateTime<Utc>,
) -> SourceResult<Route> {
    let bgp = decode_bgp_info(&path.pattrs)?;
    let gateway = if bgp.next_hop.is_empty() {
        path.neighbor_ip.clone()
    } else {
        bgp.next_hop.clone()
    };

    Ok(Route {
        id: prefix.to_string(),
        neighbor_id: neighbor_id.to_string(),
        network: prefix.to_string(),
        gateway,
        metric: bgp.med,
        age: path_age(path, now),
        primary: path.best,
        bgp,
    })
}
