//! Custom-DNS chain stage: static name → IP overrides.
//!
//! A matching A/AAAA question is answered locally with a fixed TTL and
//! never reaches an upstream. A name match whose records don't cover
//! the asked family passes through.

use crate::dns::message;
use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use rustc_hash::FxBuildHasher;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;
use warden_dns_application::ports::Resolver;
use warden_dns_domain::{DnsError, DnsRequest, DnsResponse, ResponseKind};

pub struct CustomDnsResolver {
    next: Arc<dyn Resolver>,
    exact: HashMap<String, Vec<IpAddr>, FxBuildHasher>,
    /// `*.suffix` entries; longest suffix wins.
    wildcards: Vec<(String, Vec<IpAddr>)>,
    ttl: u32,
}

impl CustomDnsResolver {
    /// `mapping` entries are lowercased names, optionally `*.`-prefixed.
    pub fn new(next: Arc<dyn Resolver>, mapping: Vec<(String, Vec<IpAddr>)>, ttl: u32) -> Self {
        let mut exact = HashMap::with_hasher(FxBuildHasher);
        let mut wildcards = Vec::new();

        for (name, ips) in mapping {
            match name.strip_prefix("*.") {
                Some(suffix) => wildcards.push((suffix.to_string(), ips)),
                None => {
                    exact.insert(name, ips);
                }
            }
        }
        wildcards.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            next,
            exact,
            wildcards,
            ttl,
        }
    }

    fn lookup(&self, name: &str) -> Option<&[IpAddr]> {
        if let Some(ips) = self.exact.get(name) {
            return Some(ips);
        }
        self.wildcards
            .iter()
            .find(|(suffix, _)| {
                name.len() > suffix.len() && name.ends_with(suffix) && {
                    let boundary = name.len() - suffix.len() - 1;
                    name.as_bytes()[boundary] == b'.'
                }
            })
            .map(|(_, ips)| ips.as_slice())
    }
}

#[async_trait]
impl Resolver for CustomDnsResolver {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        let Some(question) = request.single_question() else {
            return self.next.resolve(request).await;
        };
        let qtype = question.query_type();
        if !matches!(qtype, RecordType::A | RecordType::AAAA) {
            return self.next.resolve(request).await;
        }

        let qname = question.name().clone();
        let name = qname.to_utf8().to_ascii_lowercase();
        let name = name.trim_end_matches('.');

        if let Some(ips) = self.lookup(name) {
            let answers = message::address_records(&qname, qtype, ips, self.ttl);
            // Name matches, but no record of the asked family exists:
            // let the rest of the chain answer.
            if !answers.is_empty() {
                debug!(name = %name, record_type = %qtype, "Answered from custom DNS mapping");
                let msg = message::answer_message(&request.message, answers);
                return Ok(DnsResponse::new(msg, ResponseKind::CustomDns, self.name()));
            }
        }

        self.next.resolve(request).await
    }

    fn configuration(&self) -> Vec<String> {
        let mut lines = vec![format!("ttl     = {}s", self.ttl)];
        let mut names: Vec<&String> = self.exact.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("mapping = {name}"));
        }
        for (suffix, _) in &self.wildcards {
            lines.push(format!("mapping = *.{suffix}"));
        }
        lines
    }

    fn name(&self) -> &'static str {
        "custom_dns"
    }
}
