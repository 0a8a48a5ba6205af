use hickory_proto::op::Message;
use std::fmt;

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Answered by an upstream server.
    Resolved,
    /// Served from the response cache.
    Cached,
    /// Synthesized by the blocking stage.
    Blocked,
    /// Resolved through a conditional-forwarding zone override.
    Conditional,
    /// Synthesized from a static custom-DNS mapping.
    CustomDns,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "RESOLVED",
            Self::Cached => "CACHED",
            Self::Blocked => "BLOCKED",
            Self::Conditional => "CONDITIONAL",
            Self::CustomDns => "CUSTOM_DNS",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response travelling back up the resolver chain.
#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub message: Message,
    pub kind: ResponseKind,
    /// Name of the stage that produced the message.
    pub resolver: &'static str,
}

impl DnsResponse {
    pub fn new(message: Message, kind: ResponseKind, resolver: &'static str) -> Self {
        Self {
            message,
            kind,
            resolver,
        }
    }
}
