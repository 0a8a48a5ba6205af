//! TCP transport: DNS messages framed by a 2-byte length prefix.

use super::{resolve_authority, DnsTransport, TransportResponse};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use warden_dns_domain::DnsError;

const MAX_TCP_MESSAGE_SIZE: usize = 65535;

pub struct TcpTransport {
    authority: String,
}

impl TcpTransport {
    pub fn new(authority: String) -> Self {
        Self { authority }
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError> {
        let server_addr = resolve_authority(&self.authority).await?;

        let mut stream = tokio::time::timeout(timeout, TcpStream::connect(server_addr))
            .await
            .map_err(|_| DnsError::UpstreamTimeout {
                server: self.authority.clone(),
            })?
            .map_err(|_| DnsError::UpstreamConnectionRefused {
                server: self.authority.clone(),
            })?;

        tokio::time::timeout(timeout, send_with_length_prefix(&mut stream, message_bytes))
            .await
            .map_err(|_| DnsError::UpstreamTimeout {
                server: self.authority.clone(),
            })?
            .map_err(|e| DnsError::UpstreamFailure {
                server: self.authority.clone(),
                reason: e,
            })?;

        let response_bytes = tokio::time::timeout(timeout, read_with_length_prefix(&mut stream))
            .await
            .map_err(|_| DnsError::UpstreamTimeout {
                server: self.authority.clone(),
            })?
            .map_err(|e| DnsError::UpstreamFailure {
                server: self.authority.clone(),
                reason: e,
            })?;

        debug!(
            server = %self.authority,
            response_len = response_bytes.len(),
            "TCP response received"
        );

        Ok(TransportResponse {
            bytes: response_bytes,
            protocol_used: "TCP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

pub(crate) async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> Result<(), String>
where
    S: AsyncWriteExt + Unpin,
{
    let length = message_bytes.len() as u16;
    stream
        .write_all(&length.to_be_bytes())
        .await
        .map_err(|e| format!("failed to write length prefix: {e}"))?;
    stream
        .write_all(message_bytes)
        .await
        .map_err(|e| format!("failed to write DNS message: {e}"))?;
    stream
        .flush()
        .await
        .map_err(|e| format!("failed to flush stream: {e}"))?;
    Ok(())
}

pub(crate) async fn read_with_length_prefix<S>(stream: &mut S) -> Result<Vec<u8>, String>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| format!("failed to read response length: {e}"))?;

    let response_len = u16::from_be_bytes(len_buf) as usize;
    if response_len > MAX_TCP_MESSAGE_SIZE {
        return Err(format!(
            "response too large: {response_len} bytes (max {MAX_TCP_MESSAGE_SIZE})"
        ));
    }

    let mut response = vec![0u8; response_len];
    stream
        .read_exact(&mut response)
        .await
        .map_err(|e| format!("failed to read response body: {e}"))?;

    Ok(response)
}
