use async_trait::async_trait;
use warden_dns_domain::{DnsError, DnsRequest, DnsResponse};

/// One stage of the resolver chain.
///
/// Each stage either answers the request itself, annotates it and hands
/// it to its successor, or post-processes the successor's response.
/// Stages are built once at startup and must be safe for concurrent
/// callers; per-request state lives on the request itself.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError>;

    /// Printable description of this stage's configuration, consumed by
    /// the startup log and the observability layer.
    fn configuration(&self) -> Vec<String> {
        Vec::new()
    }

    /// Short stable stage name, used as the response's producer tag.
    fn name(&self) -> &'static str;
}
