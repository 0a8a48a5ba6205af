pub mod blocking;
pub mod builder;
pub mod caching;
pub mod client_name;
pub mod conditional;
pub mod custom_dns;
pub mod dispatcher;
pub mod query_log;
pub mod stats;

pub use blocking::BlockingResolver;
pub use builder::{BuiltChain, ChainBuilder};
pub use caching::CachingResolver;
pub use client_name::ClientNameResolver;
pub use conditional::ConditionalForwarderResolver;
pub use custom_dns::CustomDnsResolver;
pub use dispatcher::UpstreamDispatcher;
pub use query_log::QueryLoggerResolver;
pub use stats::StatsRecorderResolver;
