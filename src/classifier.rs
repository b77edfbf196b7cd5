/// Route classification by reject communities
///
/// Route servers tag routes they rejected with a large community instead of
/// dropping them. A route is filtered iff any of its large communities matches
/// a pattern of the route server's reject policy; every other route is
/// imported. Classification is pure and per route, so identical input always
/// yields identical partitions.
use crate::api::{LargeCommunity, Route};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One component of a community pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternPart {
    Exact(u32),
    Any,
}

impl PatternPart {
    fn matches(&self, value: u32) -> bool {
        match self {
            PatternPart::Exact(expected) => *expected == value,
            PatternPart::Any => true,
        }
    }
}

impl fmt::Display for PatternPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternPart::Exact(v) => write!(f, "{}", v),
            PatternPart::Any => f.write_str("*"),
        }
    }
}

/// Large-community pattern, e.g. `65000:0:*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommunityPattern(pub [PatternPart; 3]);

impl CommunityPattern {
    pub fn exact(community: LargeCommunity) -> Self {
        CommunityPattern([
            PatternPart::Exact(community.0),
            PatternPart::Exact(community.1),
            PatternPart::Exact(community.2),
        ])
    }

    pub fn matches(&self, community: &LargeCommunity) -> bool {
        let [a, b, c] = &self.0;
        a.matches(community.0) && b.matches(community.1) && c.matches(community.2)
    }
}

impl FromStr for CommunityPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 3 {
            return Err(format!(
                "reject community '{}' must have three components",
                s
            ));
        }

        let mut out = [PatternPart::Any; 3];
        for (slot, part) in out.iter_mut().zip(parts) {
            *slot = match part.trim() {
                "*" => PatternPart::Any,
                value => PatternPart::Exact(value.parse().map_err(|_| {
                    format!("invalid component '{}' in reject community '{}'", value, s)
                })?),
            };
        }
        Ok(CommunityPattern(out))
    }
}

impl fmt::Display for CommunityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = &self.0;
        write!(f, "{}:{}:{}", a, b, c)
    }
}

/// Ordered set of reject patterns for one route server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectPolicy {
    patterns: Vec<CommunityPattern>,
}

impl RejectPolicy {
    pub fn new(patterns: Vec<CommunityPattern>) -> Self {
        Self { patterns }
    }

    /// Parse the configured pattern strings
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Result<Self, String> {
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if the route carries a large community matched by the policy
    pub fn rejects(&self, route: &Route) -> bool {
        route
            .bgp
            .large_communities
            .iter()
            .any(|c| self.patterns.iter().any(|p| p.matches(c)))
    }
}

/// Imported and filtered routes, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    pub imported: Vec<Route>,
    pub filtered: Vec<Route>,
}

/// Partition routes into imported and filtered
pub fn classify(routes: Vec<Route>, policy: &RejectPolicy) -> Classified {
    let (filtered, imported) = routes.into_iter().partition(|r| policy.rejects(r));
    Classified { imported, filtered }
}

/// Routes the policy accepts
pub fn received_routes(routes: Vec<Route>, policy: &RejectPolicy) -> Vec<Route> {
    routes.into_iter().filter(|r| !policy.rejects(r)).collect()
}

/// Routes the policy rejects
pub fn rejected_routes(routes: Vec<Route>, policy: &RejectPolicy) -> Vec<Route> {
    routes.into_iter().filter(|r| policy.rejects(r)).collect()
}
