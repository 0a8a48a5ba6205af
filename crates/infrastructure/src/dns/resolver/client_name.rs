//! Client-name chain stage.
//!
//! On first sight of a client IP a PTR query goes to the configured
//! lookup upstream; the result is cached (with separate positive and
//! negative TTLs) and concurrent lookups for the same IP coalesce onto
//! one flight. Lookup failure annotates the IP literal; this stage
//! never fails a request.

use super::dispatcher::UpstreamDispatcher;
use crate::dns::single_flight::SingleFlight;
use async_trait::async_trait;
use dashmap::DashMap;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use rustc_hash::FxBuildHasher;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use warden_dns_application::ports::Resolver;
use warden_dns_domain::{DnsError, DnsRequest, DnsResponse, Upstream};

#[derive(Clone)]
struct CachedNames {
    names: Vec<String>,
    expires_at: Instant,
}

pub struct ClientNameResolver {
    next: Arc<dyn Resolver>,
    dispatcher: Arc<UpstreamDispatcher>,
    ptr_upstreams: Arc<Vec<Upstream>>,
    single_name_order: Vec<usize>,
    cache: DashMap<IpAddr, CachedNames, FxBuildHasher>,
    inflight: SingleFlight<IpAddr, Vec<String>>,
    positive_ttl: Duration,
    negative_ttl: Duration,
}

fn ip_to_reverse_domain(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            format!(
                "{}.{}.{}.{}.in-addr.arpa",
                octets[3], octets[2], octets[1], octets[0]
            )
        }
        IpAddr::V6(ipv6) => {
            let mut nibbles = Vec::new();
            for byte in ipv6.octets().iter().rev() {
                nibbles.push(format!("{:x}", byte & 0x0f));
                nibbles.push(format!("{:x}", (byte >> 4) & 0x0f));
            }
            format!("{}.ip6.arpa", nibbles.join("."))
        }
    }
}

impl ClientNameResolver {
    pub fn new(
        next: Arc<dyn Resolver>,
        upstream: Upstream,
        single_name_order: Vec<usize>,
        positive_ttl: Duration,
        negative_ttl: Duration,
        query_timeout: Duration,
    ) -> Self {
        let ptr_upstreams = Arc::new(vec![upstream]);
        let dispatcher = Arc::new(UpstreamDispatcher::new(
            ptr_upstreams.as_ref().clone(),
            1,
            query_timeout,
        ));
        Self {
            next,
            dispatcher,
            ptr_upstreams,
            single_name_order,
            cache: DashMap::with_hasher(FxBuildHasher),
            inflight: SingleFlight::new(),
            positive_ttl,
            negative_ttl,
        }
    }

    fn ptr_query(ip: &IpAddr) -> Result<Message, DnsError> {
        let reverse_domain = ip_to_reverse_domain(ip);
        let name = Name::from_str(&reverse_domain)
            .map_err(|e| DnsError::MessageFormat(format!("bad PTR name: {e}")))?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(RecordType::PTR);
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new();
        message.set_id(fastrand::u16(..));
        message.set_message_type(MessageType::Query);
        message.set_op_code(OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);
        Ok(message)
    }

    /// Applies `singleNameOrder`: the first configured 1-based position
    /// that exists selects a single name; otherwise all names are kept.
    fn select_names(&self, mut names: Vec<String>) -> Vec<String> {
        names.sort();
        for position in &self.single_name_order {
            if let Some(name) = names.get(position - 1) {
                return vec![name.clone()];
            }
        }
        names
    }

    /// Resolves the client IP to names, caching both outcomes. Always
    /// produces at least the IP literal.
    async fn client_names(&self, ip: IpAddr) -> Vec<String> {
        if let Some(entry) = self.cache.get(&ip) {
            if Instant::now() < entry.expires_at {
                return entry.names.clone();
            }
        }

        self.inflight
            .run(ip, async {
                let (names, positive) = self.lookup(ip).await;
                let ttl = if positive {
                    self.positive_ttl
                } else {
                    self.negative_ttl
                };
                self.cache.insert(
                    ip,
                    CachedNames {
                        names: names.clone(),
                        expires_at: Instant::now() + ttl,
                    },
                );
                Ok(names)
            })
            .await
            .unwrap_or_else(|_| vec![ip.to_string()])
    }

    async fn lookup(&self, ip: IpAddr) -> (Vec<String>, bool) {
        let query = match Self::ptr_query(&ip) {
            Ok(q) => q,
            Err(_) => return (vec![ip.to_string()], false),
        };

        match self.dispatcher.dispatch(&query, &self.ptr_upstreams).await {
            Ok(answer) => {
                let names: Vec<String> = answer
                    .answers()
                    .iter()
                    .filter_map(|record| match record.data() {
                        RData::PTR(ptr) => {
                            Some(ptr.to_utf8().trim_end_matches('.').to_string())
                        }
                        _ => None,
                    })
                    .collect();

                if names.is_empty() {
                    debug!(ip = %ip, "PTR lookup returned no names");
                    (vec![ip.to_string()], false)
                } else {
                    let selected = self.select_names(names);
                    debug!(ip = %ip, names = ?selected, "PTR lookup successful");
                    (selected, true)
                }
            }
            Err(e) => {
                debug!(ip = %ip, error = %e, "PTR lookup failed");
                (vec![ip.to_string()], false)
            }
        }
    }
}

#[async_trait]
impl Resolver for ClientNameResolver {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        request.client_names = self.client_names(request.client_addr.ip()).await;
        self.next.resolve(request).await
    }

    fn configuration(&self) -> Vec<String> {
        vec![
            format!("upstream          = {}", self.ptr_upstreams[0]),
            format!("singleNameOrder   = {:?}", self.single_name_order),
            format!("cacheTime         = {}s", self.positive_ttl.as_secs()),
            format!("negativeCacheTime = {}s", self.negative_ttl.as_secs()),
        ]
    }

    fn name(&self) -> &'static str {
        "client_name"
    }
}
