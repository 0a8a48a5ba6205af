pub mod https;
pub mod tcp;
pub mod tls;
pub mod udp;

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use warden_dns_domain::{DnsError, Upstream, UpstreamKind};

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,
    pub protocol_used: &'static str,
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError>;

    fn protocol_name(&self) -> &'static str;
}

/// Enum dispatch over the four transports, no per-query heap alloc.
pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
    Tls(tls::TlsTransport),
    Https(https::HttpsTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tls(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Https(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(_) => "UDP",
            Self::Tcp(_) => "TCP",
            Self::Tls(_) => "TLS",
            Self::Https(_) => "HTTPS",
        }
    }
}

pub fn create_transport(upstream: &Upstream) -> Transport {
    match upstream.net {
        UpstreamKind::Udp => Transport::Udp(udp::UdpTransport::new(upstream.authority())),
        UpstreamKind::Tcp => Transport::Tcp(tcp::TcpTransport::new(upstream.authority())),
        UpstreamKind::TcpTls => Transport::Tls(tls::TlsTransport::new(
            upstream.authority(),
            upstream.host.clone(),
        )),
        UpstreamKind::Https => Transport::Https(https::HttpsTransport::new(upstream.url())),
    }
}

/// Resolves `host:port` to a socket address, using the system resolver
/// for hostnames.
pub(crate) async fn resolve_authority(authority: &str) -> Result<SocketAddr, DnsError> {
    if let Ok(addr) = authority.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let mut addrs = tokio::net::lookup_host(authority)
        .await
        .map_err(|e| DnsError::UpstreamFailure {
            server: authority.to_string(),
            reason: format!("hostname lookup failed: {e}"),
        })?;
    addrs.next().ok_or_else(|| DnsError::UpstreamFailure {
        server: authority.to_string(),
        reason: "hostname resolved to no addresses".to_string(),
    })
}
