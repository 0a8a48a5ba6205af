use serde::{Deserialize, Serialize};

/// The `caching` config section. Times are minutes; 0 means "unset"
/// (no floor for `minCachingTime`, no cap for `maxCachingTime`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CachingConfig {
    #[serde(rename = "minCachingTime", default)]
    pub min_caching_time: u64,

    #[serde(rename = "maxCachingTime", default)]
    pub max_caching_time: u64,

    /// Cap on negative-response TTLs derived from SOA minimums.
    #[serde(rename = "negativeCacheTime", default = "default_negative_cache_time")]
    pub negative_cache_time: u64,

    /// Entry-count bound on the cache; 0 means unbounded.
    #[serde(rename = "maxItemsCount", default = "default_max_items_count")]
    pub max_items_count: usize,
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            min_caching_time: 0,
            max_caching_time: 0,
            negative_cache_time: default_negative_cache_time(),
            max_items_count: default_max_items_count(),
        }
    }
}

fn default_negative_cache_time() -> u64 {
    30
}

fn default_max_items_count() -> usize {
    200_000
}
