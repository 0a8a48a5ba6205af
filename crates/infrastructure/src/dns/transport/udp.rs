//! Plain UDP transport (RFC 1035 §4.2.1).
//!
//! Messages are sent as-is, no framing. Responses are read into a
//! 4096-byte buffer (the EDNS(0) payload we advertise); a response with
//! TC=1 is the dispatcher's cue to retry over TCP.

use super::{resolve_authority, DnsTransport, TransportResponse};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};
use warden_dns_domain::DnsError;

const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpTransport {
    authority: String,
}

impl UdpTransport {
    pub fn new(authority: String) -> Self {
        Self { authority }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError> {
        let server_addr = resolve_authority(&self.authority).await?;

        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            "0.0.0.0:0".parse().expect("valid wildcard addr")
        } else {
            "[::]:0".parse().expect("valid wildcard addr")
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DnsError::UpstreamFailure {
                server: self.authority.clone(),
                reason: format!("failed to bind UDP socket: {e}"),
            })?;

        tokio::time::timeout(timeout, socket.send_to(message_bytes, server_addr))
            .await
            .map_err(|_| DnsError::UpstreamTimeout {
                server: self.authority.clone(),
            })?
            .map_err(|e| DnsError::UpstreamFailure {
                server: self.authority.clone(),
                reason: format!("UDP send failed: {e}"),
            })?;

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let (bytes_received, from_addr) =
            tokio::time::timeout(timeout, socket.recv_from(&mut recv_buf))
                .await
                .map_err(|_| DnsError::UpstreamTimeout {
                    server: self.authority.clone(),
                })?
                .map_err(|e| DnsError::UpstreamFailure {
                    server: self.authority.clone(),
                    reason: format!("UDP receive failed: {e}"),
                })?;

        if from_addr.ip() != server_addr.ip() {
            warn!(
                expected = %server_addr,
                received_from = %from_addr,
                "UDP response from unexpected source"
            );
        }

        recv_buf.truncate(bytes_received);

        debug!(
            server = %self.authority,
            bytes_received,
            "UDP response received"
        );

        Ok(TransportResponse {
            bytes: recv_buf,
            protocol_used: "UDP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_creation() {
        let transport = UdpTransport::new("8.8.8.8:53".to_string());
        assert_eq!(transport.protocol_name(), "UDP");
    }
}
