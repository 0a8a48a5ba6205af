//! Blocking chain stage: per-client-group allow/deny decisions.
//!
//! The stage computes the client's effective groups, consults the list
//! engine's active snapshot, and either forwards or synthesizes a block
//! response. Decisions are stable under case changes and trailing-dot
//! differences because the engine only ever sees normalized names.

use crate::dns::block_filter::{BlockDecision, BlockingEngine, EngineStatus};
use crate::dns::message;
use async_trait::async_trait;
use hickory_proto::rr::{Name, RecordType};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;
use warden_dns_application::ports::Resolver;
use warden_dns_domain::config::BlockType;
use warden_dns_domain::{ClientGroups, DnsError, DnsRequest, DnsResponse, ResponseKind};

pub struct BlockingResolver {
    next: Arc<dyn Resolver>,
    engine: Arc<BlockingEngine>,
    groups: Arc<ClientGroups>,
    block_type: BlockType,
    block_ttl: u32,
    custom_ips: Vec<IpAddr>,
}

impl BlockingResolver {
    pub fn new(
        next: Arc<dyn Resolver>,
        engine: Arc<BlockingEngine>,
        groups: Arc<ClientGroups>,
        block_type: BlockType,
        block_ttl: u32,
        custom_ips: Vec<IpAddr>,
    ) -> Self {
        Self {
            next,
            engine,
            groups,
            block_type,
            block_ttl,
            custom_ips,
        }
    }

    fn block_response(&self, request: &DnsRequest, qname: Name, qtype: RecordType) -> DnsResponse {
        let msg = match self.block_type {
            BlockType::NxDomain => message::nxdomain_message(&request.message),
            BlockType::ZeroIp | BlockType::Custom => {
                let ips: Vec<IpAddr> = match self.block_type {
                    BlockType::ZeroIp => match qtype {
                        RecordType::A => vec![IpAddr::from([0u8, 0, 0, 0])],
                        RecordType::AAAA => vec![IpAddr::from([0u16; 8])],
                        _ => vec![],
                    },
                    _ => self.custom_ips.clone(),
                };

                let answers = message::address_records(&qname, qtype, &ips, self.block_ttl);
                message::answer_message(&request.message, answers)
            }
        };

        DnsResponse::new(msg, ResponseKind::Blocked, self.name())
    }
}

#[async_trait]
impl Resolver for BlockingResolver {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        let client_ip = request.client_addr.ip();
        request.client_groups = self
            .groups
            .effective_groups(client_ip, &request.client_names);

        let Some(question) = request.single_question() else {
            return self.next.resolve(request).await;
        };
        let qname = question.name().clone();
        let qtype = question.query_type();
        let name = qname.to_utf8().to_ascii_lowercase();
        let name = name.trim_end_matches('.').to_string();

        match self
            .engine
            .decision(&request.client_groups, &name, client_ip)
        {
            BlockDecision::Allow | BlockDecision::NoMatch => self.next.resolve(request).await,
            BlockDecision::Deny => {
                debug!(
                    name = %name,
                    client = %client_ip,
                    groups = ?request.client_groups,
                    "Query blocked"
                );
                Ok(self.block_response(request, qname, qtype))
            }
        }
    }

    fn configuration(&self) -> Vec<String> {
        let status = match self.engine.status() {
            EngineStatus::Ready => "READY",
            EngineStatus::Loading => "LOADING",
        };
        let mut lines = vec![
            format!("blockType = {}", self.block_type.as_str()),
            format!("blockTTL  = {}s", self.block_ttl),
            format!("status    = {status}"),
            format!("entries   = {}", self.engine.entry_count()),
        ];
        for group in self.engine.group_names() {
            lines.push(format!("group     = {group}"));
        }
        lines
    }

    fn name(&self) -> &'static str {
        "blocking"
    }
}
