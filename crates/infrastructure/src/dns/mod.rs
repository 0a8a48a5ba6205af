pub mod block_filter;
pub mod breaker;
pub mod cache;
pub mod message;
pub mod query_log;
pub mod resolver;
pub mod single_flight;
pub mod stats;
pub mod transport;

pub use breaker::CircuitBreaker;
pub use cache::{CacheKey, CachedResponse, DnsCache};
pub use query_log::TracingQueryLog;
pub use single_flight::SingleFlight;
pub use stats::{StatsRegistry, StatsSnapshot};
