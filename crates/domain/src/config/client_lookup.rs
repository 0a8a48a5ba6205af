use crate::upstream::Upstream;
use serde::{Deserialize, Serialize};

/// The `clientLookup` config section: how client IPs are reverse-resolved
/// to names for logging and group assignment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientLookupConfig {
    /// Upstream used for PTR queries. Unspecified disables the lookup.
    #[serde(default)]
    pub upstream: Upstream,

    /// 1-based preference order when a client has multiple PTR names;
    /// empty keeps all names.
    #[serde(rename = "singleNameOrder", default)]
    pub single_name_order: Vec<usize>,

    /// Minutes a successful lookup is cached.
    #[serde(rename = "cacheTime", default = "default_cache_time")]
    pub cache_time: u64,

    /// Minutes a failed lookup is cached.
    #[serde(rename = "negativeCacheTime", default = "default_negative_cache_time")]
    pub negative_cache_time: u64,
}

impl Default for ClientLookupConfig {
    fn default() -> Self {
        Self {
            upstream: Upstream::default(),
            single_name_order: Vec::new(),
            cache_time: default_cache_time(),
            negative_cache_time: default_negative_cache_time(),
        }
    }
}

impl ClientLookupConfig {
    pub fn enabled(&self) -> bool {
        !self.upstream.is_unspecified()
    }
}

fn default_cache_time() -> u64 {
    60
}

fn default_negative_cache_time() -> u64 {
    10
}
