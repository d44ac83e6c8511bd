//! Cache diagnostic DTOs.

use crate::policy::{CacheFootprint, KeyFootprint};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Size of one observed cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CacheKeySize {
    #[schema(example = "users")]
    pub key: String,
    /// Serialized size in bytes; absent when the key is not cached.
    pub size_bytes: Option<usize>,
    pub missing: bool,
}

impl From<&KeyFootprint> for CacheKeySize {
    fn from(entry: &KeyFootprint) -> Self {
        Self {
            key: entry.key.to_string(),
            size_bytes: entry.bytes,
            missing: entry.is_missing(),
        }
    }
}

/// Cache footprint report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CacheFootprintResponse {
    pub entries: Vec<CacheKeySize>,
    /// Sum over present keys only.
    pub total_bytes: usize,
}

impl From<CacheFootprint> for CacheFootprintResponse {
    fn from(footprint: CacheFootprint) -> Self {
        Self {
            entries: footprint.keys.iter().map(CacheKeySize::from).collect(),
            total_bytes: footprint.total_bytes,
        }
    }
}
