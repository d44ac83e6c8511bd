//! Cache footprint diagnostic.

use crate::cache::{cache_keys, CacheInterface};
use cairn_core::CairnResult;
use tracing::info;

/// Serialized size of one observed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFootprint {
    pub key: &'static str,
    /// Byte length of the stored JSON, or `None` when the key is absent.
    pub bytes: Option<usize>,
}

impl KeyFootprint {
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.bytes.is_none()
    }
}

/// Sizes of the listing keys and their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFootprint {
    pub keys: Vec<KeyFootprint>,
    /// Sum over present keys only.
    pub total_bytes: usize,
}

impl CacheFootprint {
    /// Looks up one key's entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&KeyFootprint> {
        self.keys.iter().find(|entry| entry.key == key)
    }

    /// Keys that were absent when measured.
    pub fn missing(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keys.iter().filter(|entry| entry.is_missing()).map(|entry| entry.key)
    }
}

pub(super) async fn measure(cache: &dyn CacheInterface) -> CairnResult<CacheFootprint> {
    let mut keys = Vec::with_capacity(cache_keys::OBSERVED_KEYS.len());

    for key in cache_keys::OBSERVED_KEYS {
        let bytes = cache.get_raw(key).await?.map(|value| value.len());
        match bytes {
            Some(bytes) => info!(key, bytes, "Cache key size"),
            None => info!(key, "Cache key missing"),
        }
        keys.push(KeyFootprint { key, bytes });
    }

    let total_bytes = keys.iter().filter_map(|entry| entry.bytes).sum();
    info!(total_bytes, "Cache footprint measured");

    Ok(CacheFootprint { keys, total_bytes })
}
