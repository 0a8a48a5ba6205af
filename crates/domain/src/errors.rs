use thiserror::Error;

/// Errors surfaced by the resolver chain and its collaborators.
///
/// Cloneable so that coalesced waiters of a single-flight operation can
/// all receive the leader's failure.
#[derive(Error, Debug, Clone)]
pub enum DnsError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid upstream '{input}': {reason}")]
    UpstreamParse { input: String, reason: String },

    #[error("Upstream {server} failed: {reason}")]
    UpstreamFailure { server: String, reason: String },

    #[error("Timeout talking to upstream {server}")]
    UpstreamTimeout { server: String },

    #[error("Connection refused by upstream {server}")]
    UpstreamConnectionRefused { server: String },

    #[error("All upstream servers failed")]
    AllUpstreamsFailed,

    #[error("List fetch failed for {source_name}: {reason}")]
    ListFetch { source_name: String, reason: String },

    #[error("Unparseable list entry: {0}")]
    ListParse(String),

    #[error("Malformed DNS request: {0}")]
    RequestMalformed(String),

    #[error("Invalid DNS message: {0}")]
    MessageFormat(String),
}

impl DnsError {
    /// True when the error indicates the server was unreachable rather
    /// than answering with a DNS-level failure, i.e. the dispatcher
    /// should move on and the circuit breaker should count it.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            DnsError::UpstreamFailure { .. }
                | DnsError::UpstreamTimeout { .. }
                | DnsError::UpstreamConnectionRefused { .. }
        )
    }
}
