pub mod client_groups;
pub mod config;
pub mod errors;
pub mod request;
pub mod response;
pub mod upstream;

pub use client_groups::{ClientGroups, DEFAULT_GROUP};
pub use config::{Config, ConfigError};
pub use errors::DnsError;
pub use request::{DnsRequest, ListenerProtocol};
pub use response::{DnsResponse, ResponseKind};
pub use upstream::{parse_upstream_list, Upstream, UpstreamKind};
