use crate::upstream::Upstream;
use hickory_proto::op::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Listener protocol the request arrived over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerProtocol {
    Udp,
    Tcp,
}

impl ListenerProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
        }
    }
}

/// One client query travelling through the resolver chain.
///
/// The question message is treated as immutable; the annotation fields
/// are filled in by stages as the request moves down the chain. A
/// request is owned by a single task end to end, so the annotations are
/// plain mutable state.
#[derive(Debug, Clone)]
pub struct DnsRequest {
    pub message: Message,
    pub client_addr: SocketAddr,
    pub protocol: ListenerProtocol,
    pub received_at: Instant,
    pub received_wall: SystemTime,

    /// Names resolved for the client IP, or the IP literal on failure.
    pub client_names: Vec<String>,
    /// Effective blocking groups for this client.
    pub client_groups: Vec<String>,
    /// Per-request replacement for the global upstream set.
    pub upstream_override: Option<Arc<Vec<Upstream>>>,
}

impl DnsRequest {
    pub fn new(message: Message, client_addr: SocketAddr, protocol: ListenerProtocol) -> Self {
        Self {
            message,
            client_addr,
            protocol,
            received_at: Instant::now(),
            received_wall: SystemTime::now(),
            client_names: Vec::new(),
            client_groups: Vec::new(),
            upstream_override: None,
        }
    }

    /// The single question, when the message carries exactly one.
    /// Multi-question messages pass through the chain untouched.
    pub fn single_question(&self) -> Option<&hickory_proto::op::Query> {
        match self.message.queries() {
            [q] => Some(q),
            _ => None,
        }
    }

    /// Question name lowercased with the trailing dot removed; the
    /// normalization every name-matching stage agrees on.
    pub fn normalized_name(&self) -> Option<String> {
        self.single_question().map(|q| {
            let name = q.name().to_utf8().to_ascii_lowercase();
            name.trim_end_matches('.').to_string()
        })
    }
}
