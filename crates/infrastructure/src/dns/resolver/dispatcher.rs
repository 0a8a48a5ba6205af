//! Terminal chain stage: forwards the query to the configured upstream
//! set and returns the first usable answer.
//!
//! Up to `resolver_count` upstreams are picked at random (without
//! replacement) and raced; the first non-SERVFAIL answer wins and the
//! losing flights are aborted. If every racer fails, the remaining
//! upstreams are tried sequentially. Total failure becomes a SERVFAIL
//! response, never an error, so callers always have a message to send.

use crate::dns::breaker::CircuitBreaker;
use crate::dns::message;
use crate::dns::transport;
use async_trait::async_trait;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use hickory_proto::op::{Message, ResponseCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use warden_dns_application::ports::Resolver;
use warden_dns_domain::{DnsError, DnsRequest, DnsResponse, ResponseKind, Upstream, UpstreamKind};

pub struct UpstreamDispatcher {
    upstreams: Arc<Vec<Upstream>>,
    resolver_count: usize,
    timeout: Duration,
    breaker: Arc<CircuitBreaker>,
}

/// One attempt against one upstream: build transport, send, parse.
/// A truncated UDP answer is retried over TCP against the same
/// host:port within the remaining deadline.
async fn query_upstream(
    upstream: &Upstream,
    message_bytes: &[u8],
    timeout: Duration,
) -> Result<Message, DnsError> {
    let start = Instant::now();

    let dns_transport = transport::create_transport(upstream);
    let response = dns_transport.send(message_bytes, timeout).await?;
    let parsed =
        Message::from_vec(&response.bytes).map_err(|e| DnsError::MessageFormat(e.to_string()))?;

    if parsed.truncated() && upstream.net == UpstreamKind::Udp {
        debug!(server = %upstream, "Response truncated (TC bit), retrying via TCP");

        let tcp_upstream = Upstream::new(UpstreamKind::Tcp, upstream.host.clone(), upstream.port);
        let remaining = timeout
            .checked_sub(start.elapsed())
            .unwrap_or(Duration::from_millis(500));

        let tcp_transport = transport::create_transport(&tcp_upstream);
        let tcp_response = tcp_transport.send(message_bytes, remaining).await?;
        return Message::from_vec(&tcp_response.bytes)
            .map_err(|e| DnsError::MessageFormat(e.to_string()));
    }

    Ok(parsed)
}

impl UpstreamDispatcher {
    pub fn new(upstreams: Vec<Upstream>, resolver_count: usize, timeout: Duration) -> Self {
        Self {
            upstreams: Arc::new(upstreams),
            resolver_count: resolver_count.max(1),
            timeout,
            breaker: Arc::new(CircuitBreaker::default()),
        }
    }

    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    /// Sends `query` to the given upstream set and returns the winning
    /// answer. Also used directly by the client-name stage for its PTR
    /// lookups.
    pub async fn dispatch(
        &self,
        query: &Message,
        upstreams: &[Upstream],
    ) -> Result<Message, DnsError> {
        if upstreams.is_empty() {
            return Err(DnsError::AllUpstreamsFailed);
        }

        let message_bytes: Arc<Vec<u8>> = Arc::new(
            query
                .to_vec()
                .map_err(|e| DnsError::MessageFormat(e.to_string()))?,
        );

        // Parked upstreams sit out the selection; if the breaker parked
        // everything, use the full set rather than giving up.
        let mut order: Vec<usize> = (0..upstreams.len())
            .filter(|&i| self.breaker.is_available(&upstreams[i]))
            .collect();
        if order.is_empty() {
            order = (0..upstreams.len()).collect();
        }
        fastrand::shuffle(&mut order);

        let race_count = self.resolver_count.min(order.len());
        let racers = order[..race_count].to_vec();
        let rest = order[race_count..].to_vec();

        debug!(
            racing = race_count,
            fallback = rest.len(),
            "Dispatching upstream race"
        );

        let mut abort_handles = Vec::with_capacity(racers.len());
        let mut flights = FuturesUnordered::new();

        for idx in racers {
            let upstream = upstreams[idx].clone();
            let bytes = Arc::clone(&message_bytes);
            let timeout = self.timeout;

            let handle = tokio::spawn(async move {
                let result = query_upstream(&upstream, &bytes, timeout).await;
                (upstream, result)
            });
            abort_handles.push(handle.abort_handle());
            flights.push(handle);
        }

        let mut winner: Option<Message> = None;
        while let Some(join_result) = flights.next().await {
            match join_result {
                Ok((upstream, Ok(answer))) => {
                    if answer.response_code() == ResponseCode::ServFail {
                        self.breaker.record_failure(&upstream);
                        debug!(server = %upstream, "Upstream answered SERVFAIL in race");
                        continue;
                    }
                    self.breaker.record_success(&upstream);
                    let canceled = abort_handles.len().saturating_sub(1);
                    for handle in &abort_handles {
                        handle.abort();
                    }
                    debug!(
                        server = %upstream,
                        canceled_flights = canceled,
                        "Fastest upstream answered, canceled the rest"
                    );
                    winner = Some(answer);
                    break;
                }
                Ok((upstream, Err(e))) => {
                    if e.is_transport_error() {
                        self.breaker.record_failure(&upstream);
                    }
                    debug!(server = %upstream, error = %e, "Upstream failed in race");
                }
                Err(e) => {
                    if !e.is_cancelled() {
                        warn!(error = %e, "Upstream flight panicked");
                    }
                }
            }
        }
        for handle in &abort_handles {
            handle.abort();
        }

        if let Some(answer) = winner {
            return Ok(answer);
        }

        // Race exhausted: walk the remaining upstreams one by one.
        for idx in rest {
            let upstream = &upstreams[idx];
            match query_upstream(upstream, &message_bytes, self.timeout).await {
                Ok(answer) if answer.response_code() != ResponseCode::ServFail => {
                    self.breaker.record_success(upstream);
                    debug!(server = %upstream, "Fallback upstream answered");
                    return Ok(answer);
                }
                Ok(_) => {
                    self.breaker.record_failure(upstream);
                    debug!(server = %upstream, "Fallback upstream answered SERVFAIL");
                }
                Err(e) => {
                    if e.is_transport_error() {
                        self.breaker.record_failure(upstream);
                    }
                    warn!(server = %upstream, error = %e, "Fallback upstream failed");
                }
            }
        }

        Err(DnsError::AllUpstreamsFailed)
    }
}

#[async_trait]
impl Resolver for UpstreamDispatcher {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        let (upstreams, kind) = match &request.upstream_override {
            Some(set) => (Arc::clone(set), ResponseKind::Conditional),
            None => (Arc::clone(&self.upstreams), ResponseKind::Resolved),
        };

        match self.dispatch(&request.message, &upstreams).await {
            Ok(mut answer) => {
                answer.set_id(request.message.id());
                Ok(DnsResponse::new(answer, kind, self.name()))
            }
            Err(e) => {
                warn!(error = %e, "All upstreams exhausted; answering SERVFAIL");
                Ok(DnsResponse::new(
                    message::servfail_message(&request.message),
                    kind,
                    self.name(),
                ))
            }
        }
    }

    fn configuration(&self) -> Vec<String> {
        let mut lines = vec![
            format!("resolverCount = {}", self.resolver_count),
            format!("timeout       = {}ms", self.timeout.as_millis()),
        ];
        for upstream in self.upstreams.iter() {
            lines.push(format!("upstream      = {upstream}"));
        }
        lines
    }

    fn name(&self) -> &'static str {
        "upstream_dispatcher"
    }
}
