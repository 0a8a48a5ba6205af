//! Query-log chain stage: side-effect only, never fails the request.

use crate::dns::message;
use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use std::sync::Arc;
use warden_dns_application::ports::{QueryLogRecord, QueryLogSink, Resolver};
use warden_dns_domain::{DnsError, DnsRequest, DnsResponse};

pub struct QueryLoggerResolver {
    next: Arc<dyn Resolver>,
    sink: Arc<dyn QueryLogSink>,
}

impl QueryLoggerResolver {
    pub fn new(next: Arc<dyn Resolver>, sink: Arc<dyn QueryLogSink>) -> Self {
        Self { next, sink }
    }

    fn record(
        &self,
        request: &DnsRequest,
        response_kind: &'static str,
        response_code: &'static str,
        answer_count: usize,
    ) -> QueryLogRecord {
        let (question, record_type) = match request.single_question() {
            Some(q) => (
                Arc::from(q.name().to_utf8().as_str()),
                q.query_type(),
            ),
            None => (Arc::from(""), RecordType::ZERO),
        };

        QueryLogRecord {
            client_ip: request.client_addr.ip(),
            protocol: request.protocol.as_str(),
            client_names: request.client_names.clone().into(),
            question,
            record_type,
            response_kind,
            response_code,
            answer_count,
            duration_ms: request.received_at.elapsed().as_millis() as u64,
        }
    }
}

#[async_trait]
impl Resolver for QueryLoggerResolver {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        let result = self.next.resolve(request).await;

        match &result {
            Ok(response) => {
                self.sink.log(self.record(
                    request,
                    response.kind.as_str(),
                    message::rcode_str(response.message.response_code()),
                    response.message.answers().len(),
                ));
            }
            Err(_) => {
                self.sink.log(self.record(request, "FAILED", "SERVFAIL", 0));
            }
        }

        result
    }

    fn name(&self) -> &'static str {
        "query_logger"
    }
}
