use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata;
use hickory_proto::rr::{Name, RData, Record};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use warden_dns_application::ports::Resolver;
use warden_dns_domain::{DnsError, DnsRequest, DnsResponse, ResponseKind};
use warden_dns_infrastructure::dns::message;

/// What the mock answers with.
#[derive(Clone)]
pub enum MockReply {
    /// NOERROR with A/AAAA answers at the given TTL.
    Answer { ips: Vec<IpAddr>, ttl: u32 },
    /// NXDOMAIN, optionally with an SOA (its MINIMUM) in authority.
    NxDomain { soa_minimum: Option<u32> },
    ServFail,
    Error,
}

/// Terminal stand-in for downstream stages: counts calls, sleeps, then
/// answers according to its configured reply.
pub struct MockResolver {
    calls: AtomicUsize,
    delay: Duration,
    reply: MockReply,
}

impl MockResolver {
    pub fn new(reply: MockReply) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            reply,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn answering(ip: &str, ttl: u32) -> Self {
        Self::new(MockReply::Answer {
            ips: vec![ip.parse().unwrap()],
            ttl,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn soa_record(minimum: u32) -> Record {
    let origin = Name::from_str("example.").unwrap();
    let soa = rdata::SOA::new(
        origin.clone(),
        Name::from_str("hostmaster.example.").unwrap(),
        1,
        7200,
        3600,
        86400,
        minimum,
    );
    Record::from_rdata(origin, minimum, RData::SOA(soa))
}

#[async_trait]
impl Resolver for MockResolver {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            MockReply::Answer { ips, ttl } => {
                let question = request.single_question().expect("single question");
                let answers = message::address_records(
                    &question.name().clone(),
                    question.query_type(),
                    ips,
                    *ttl,
                );
                Ok(DnsResponse::new(
                    message::answer_message(&request.message, answers),
                    ResponseKind::Resolved,
                    "mock",
                ))
            }
            MockReply::NxDomain { soa_minimum } => {
                let mut msg = message::nxdomain_message(&request.message);
                if let Some(minimum) = soa_minimum {
                    msg.add_name_server(soa_record(*minimum));
                }
                Ok(DnsResponse::new(msg, ResponseKind::Resolved, "mock"))
            }
            MockReply::ServFail => {
                let mut msg = message::nxdomain_message(&request.message);
                msg.set_response_code(ResponseCode::ServFail);
                Ok(DnsResponse::new(msg, ResponseKind::Resolved, "mock"))
            }
            MockReply::Error => Err(DnsError::AllUpstreamsFailed),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
