//! DNS-over-HTTPS transport (RFC 8484).
//!
//! POST with `application/dns-message`; the request body is the raw
//! wire-format query and the response body the raw wire-format answer.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;
use warden_dns_domain::DnsError;

/// Shared HTTP/2 client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(4)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

pub struct HttpsTransport {
    url: String,
}

impl HttpsTransport {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait]
impl DnsTransport for HttpsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError> {
        debug!(url = %self.url, message_len = message_bytes.len(), "Sending DoH query");

        let response = tokio::time::timeout(
            timeout,
            SHARED_CLIENT
                .post(&self.url)
                .header("Content-Type", DNS_MESSAGE_CONTENT_TYPE)
                .header("Accept", DNS_MESSAGE_CONTENT_TYPE)
                .body(message_bytes.to_vec())
                .send(),
        )
        .await
        .map_err(|_| DnsError::UpstreamTimeout {
            server: self.url.clone(),
        })?
        .map_err(|e| DnsError::UpstreamFailure {
            server: self.url.clone(),
            reason: format!("DoH request failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DnsError::UpstreamFailure {
                server: self.url.clone(),
                reason: format!(
                    "DoH server returned HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            });
        }

        let response_bytes = tokio::time::timeout(timeout, response.bytes())
            .await
            .map_err(|_| DnsError::UpstreamTimeout {
                server: self.url.clone(),
            })?
            .map_err(|e| DnsError::UpstreamFailure {
                server: self.url.clone(),
                reason: format!("failed to read DoH response: {e}"),
            })?;

        debug!(
            url = %self.url,
            response_len = response_bytes.len(),
            "DoH response received"
        );

        Ok(TransportResponse {
            bytes: response_bytes.to_vec(),
            protocol_used: "HTTPS",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "HTTPS"
    }
}
