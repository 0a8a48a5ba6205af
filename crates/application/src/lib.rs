pub mod ports;

pub use ports::{QueryLogRecord, QueryLogSink, Resolver};
