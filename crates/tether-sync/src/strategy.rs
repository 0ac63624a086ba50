//! The strategy table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A single load primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Read the stored tree.
    ReadCache,
    /// Read the stored tree only if its metadata is within TTL.
    ReadCacheIfFresh,
    /// Fetch without the freshness protocol.
    FetchNetwork,
    /// Fetch with the change token, honouring not-modified.
    FetchNetworkConditional,
}

impl Step {
    /// A success on an authoritative step settles the phase.
    pub fn is_authoritative(self) -> bool {
        matches!(self, Step::ReadCacheIfFresh | Step::FetchNetworkConditional)
    }

    pub fn is_network(self) -> bool {
        matches!(self, Step::FetchNetwork | Step::FetchNetworkConditional)
    }
}

/// Primary and fallback step lists of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub primary: &'static [Step],
    pub fallback: &'static [Step],
}

/// Named load policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheOnly,
    NetworkOnly,
    CacheFirst,
    NetworkWithFallbackToCache,
    CacheWithFallbackToNetwork,
    ValidatedCacheOnly,
    ValidatedWithFallbackToCache,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown strategy: {0}")]
pub struct StrategyParseError(pub String);

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::CacheOnly,
        Strategy::NetworkOnly,
        Strategy::CacheFirst,
        Strategy::NetworkWithFallbackToCache,
        Strategy::CacheWithFallbackToNetwork,
        Strategy::ValidatedCacheOnly,
        Strategy::ValidatedWithFallbackToCache,
    ];

    pub fn plan(self) -> StepPlan {
        use Step::*;
        let (primary, fallback): (&'static [Step], &'static [Step]) = match self {
            Strategy::CacheOnly => (&[ReadCache], &[]),
            Strategy::NetworkOnly => (&[FetchNetwork], &[]),
            Strategy::CacheFirst => (&[ReadCache, FetchNetwork], &[]),
            Strategy::NetworkWithFallbackToCache => (&[FetchNetwork], &[ReadCache]),
            Strategy::CacheWithFallbackToNetwork => (&[ReadCache], &[FetchNetwork]),
            Strategy::ValidatedCacheOnly => (&[ReadCacheIfFresh, FetchNetworkConditional], &[]),
            Strategy::ValidatedWithFallbackToCache => {
                (&[ReadCacheIfFresh, FetchNetworkConditional], &[ReadCache])
            }
        };
        StepPlan { primary, fallback }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::CacheOnly => "cache-only",
            Strategy::NetworkOnly => "network-only",
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkWithFallbackToCache => "network-with-fallback-to-cache",
            Strategy::CacheWithFallbackToNetwork => "cache-with-fallback-to-network",
            Strategy::ValidatedCacheOnly => "validated-cache-only",
            Strategy::ValidatedWithFallbackToCache => "validated-with-fallback-to-cache",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| StrategyParseError(s.to_string()))
    }
}
