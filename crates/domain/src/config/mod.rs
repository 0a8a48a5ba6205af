pub mod blocking;
pub mod caching;
pub mod client_lookup;
pub mod conditional;
pub mod custom_dns;
pub mod errors;
pub mod prometheus;
pub mod root;
pub mod upstream;

pub use blocking::{BlockType, BlockingConfig};
pub use caching::CachingConfig;
pub use client_lookup::ClientLookupConfig;
pub use conditional::ConditionalConfig;
pub use custom_dns::CustomDnsConfig;
pub use errors::ConfigError;
pub use prometheus::PrometheusConfig;
pub use root::Config;
pub use upstream::UpstreamConfig;
