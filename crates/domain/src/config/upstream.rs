use crate::upstream::Upstream;
use serde::{Deserialize, Serialize};

/// The `upstream` config section: the global resolver set and how the
/// dispatcher races it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Upstream servers queried for everything no other stage answers.
    #[serde(rename = "externalResolvers", default)]
    pub external_resolvers: Vec<Upstream>,

    /// How many upstreams are raced in parallel per query.
    #[serde(rename = "resolverCount", default = "default_resolver_count")]
    pub resolver_count: usize,

    /// Per-attempt timeout in seconds.
    #[serde(rename = "queryTimeout", default = "default_query_timeout")]
    pub query_timeout: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            external_resolvers: Vec::new(),
            resolver_count: default_resolver_count(),
            query_timeout: default_query_timeout(),
        }
    }
}

fn default_resolver_count() -> usize {
    2
}

fn default_query_timeout() -> u64 {
    2
}
