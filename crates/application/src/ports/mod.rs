pub mod query_log;
pub mod resolver;

pub use query_log::{QueryLogRecord, QueryLogSink};
pub use resolver::Resolver;
