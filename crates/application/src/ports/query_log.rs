use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::sync::Arc;

/// One completed request, as recorded by the query-log stage.
#[derive(Debug, Clone)]
pub struct QueryLogRecord {
    pub client_ip: IpAddr,
    pub protocol: &'static str,
    pub client_names: Arc<[String]>,
    pub question: Arc<str>,
    pub record_type: RecordType,
    pub response_kind: &'static str,
    pub response_code: &'static str,
    pub answer_count: usize,
    pub duration_ms: u64,
}

/// Sink for query-log records. Implementations must not block the
/// request path; records are handed off and written out of band.
pub trait QueryLogSink: Send + Sync {
    fn log(&self, record: QueryLogRecord);
}
