//! Cache backend and read-strategy selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which cache store backs the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Shared Redis instance.
    #[default]
    Redis,
    /// Process-local store, for development and tests.
    Memory,
}

impl CacheBackend {
    /// Returns true if the backend needs a Redis connection.
    #[must_use]
    pub const fn needs_redis(&self) -> bool {
        matches!(self, Self::Redis)
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Which strategy serves the full user listing.
///
/// The two are alternatives for the same read path and are never chained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListStrategy {
    /// Cache the whole collection under one key; a hit costs no store query.
    #[default]
    Collection,
    /// Cache only the id list; a hit still costs one indexed store query.
    Index,
}

impl fmt::Display for ListStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => write!(f, "collection"),
            Self::Index => write!(f, "index"),
        }
    }
}
