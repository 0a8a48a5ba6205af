//! Stats chain stage: increments counters, never fails the request.

use crate::dns::message;
use crate::dns::stats::StatsRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use warden_dns_application::ports::Resolver;
use warden_dns_domain::{DnsError, DnsRequest, DnsResponse};

pub struct StatsRecorderResolver {
    next: Arc<dyn Resolver>,
    stats: Arc<StatsRegistry>,
}

impl StatsRecorderResolver {
    pub fn new(next: Arc<dyn Resolver>, stats: Arc<StatsRegistry>) -> Self {
        Self { next, stats }
    }
}

#[async_trait]
impl Resolver for StatsRecorderResolver {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        let record_type = request
            .single_question()
            .map(|q| q.query_type().to_string())
            .unwrap_or_else(|| "MULTI".to_string());

        let result = self.next.resolve(request).await;

        match &result {
            Ok(response) => self.stats.record(
                &record_type,
                response.kind.as_str(),
                message::rcode_str(response.message.response_code()),
            ),
            Err(_) => self.stats.record_failure(&record_type),
        }

        result
    }

    fn name(&self) -> &'static str {
        "stats_recorder"
    }
}
