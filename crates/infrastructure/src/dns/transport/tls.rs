//! DNS-over-TLS transport (RFC 7858): TCP framing inside a TLS session.
//!
//! SNI is the configured host when it is a name; certificate
//! verification runs against the webpki root store. Idle sessions are
//! pooled per (address, hostname) and reused.

use super::tcp::{read_with_length_prefix, send_with_length_prefix};
use super::{resolve_authority, DnsTransport, TransportResponse};
use async_trait::async_trait;
use dashmap::DashMap;
use rustls::pki_types::ServerName;
use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::debug;
use warden_dns_domain::DnsError;

const MAX_IDLE_PER_HOST: usize = 2;

static SHARED_TLS_CONFIG: LazyLock<Arc<rustls::ClientConfig>> = LazyLock::new(|| {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
});

type TlsConnection = TlsStream<TcpStream>;
type PoolKey = (SocketAddr, String);
type TlsConnectionPool = DashMap<PoolKey, Vec<TlsConnection>>;

static TLS_POOL: LazyLock<TlsConnectionPool> = LazyLock::new(TlsConnectionPool::new);

pub struct TlsTransport {
    authority: String,
    hostname: String,
}

impl TlsTransport {
    pub fn new(authority: String, hostname: String) -> Self {
        Self {
            authority,
            hostname,
        }
    }

    fn take_pooled(&self, addr: SocketAddr) -> Option<TlsConnection> {
        let key = (addr, self.hostname.clone());
        let mut entry = TLS_POOL.get_mut(&key)?;
        entry.pop()
    }

    fn return_to_pool(&self, addr: SocketAddr, stream: TlsConnection) {
        let key = (addr, self.hostname.clone());
        let mut entry = TLS_POOL.entry(key).or_default();
        if entry.len() < MAX_IDLE_PER_HOST {
            entry.push(stream);
        }
    }

    async fn connect_new(
        &self,
        addr: SocketAddr,
        timeout: Duration,
    ) -> Result<TlsConnection, DnsError> {
        let connector = tokio_rustls::TlsConnector::from(SHARED_TLS_CONFIG.clone());

        let server_name =
            ServerName::try_from(self.hostname.clone()).map_err(|e| DnsError::UpstreamFailure {
                server: self.authority.clone(),
                reason: format!("invalid TLS server name '{}': {e}", self.hostname),
            })?;

        let tcp_stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| DnsError::UpstreamTimeout {
                server: self.authority.clone(),
            })?
            .map_err(|_| DnsError::UpstreamConnectionRefused {
                server: self.authority.clone(),
            })?;

        let tls_stream = tokio::time::timeout(timeout, connector.connect(server_name, tcp_stream))
            .await
            .map_err(|_| DnsError::UpstreamTimeout {
                server: self.authority.clone(),
            })?
            .map_err(|e| DnsError::UpstreamFailure {
                server: self.authority.clone(),
                reason: format!("TLS handshake failed: {e}"),
            })?;

        debug!(server = %self.authority, hostname = %self.hostname, "TLS connection established");
        Ok(tls_stream)
    }

    async fn send_on_stream(
        &self,
        stream: &mut TlsConnection,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DnsError> {
        tokio::time::timeout(timeout, send_with_length_prefix(stream, message_bytes))
            .await
            .map_err(|_| DnsError::UpstreamTimeout {
                server: self.authority.clone(),
            })?
            .map_err(|e| DnsError::UpstreamFailure {
                server: self.authority.clone(),
                reason: e,
            })?;

        tokio::time::timeout(timeout, read_with_length_prefix(stream))
            .await
            .map_err(|_| DnsError::UpstreamTimeout {
                server: self.authority.clone(),
            })?
            .map_err(|e| DnsError::UpstreamFailure {
                server: self.authority.clone(),
                reason: e,
            })
    }
}

#[async_trait]
impl DnsTransport for TlsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError> {
        let addr = resolve_authority(&self.authority).await?;

        if let Some(mut stream) = self.take_pooled(addr) {
            match self
                .send_on_stream(&mut stream, message_bytes, timeout)
                .await
            {
                Ok(response_bytes) => {
                    debug!(server = %self.authority, "TLS query via pooled connection");
                    self.return_to_pool(addr, stream);
                    return Ok(TransportResponse {
                        bytes: response_bytes,
                        protocol_used: "TLS",
                    });
                }
                Err(_) => {
                    debug!(server = %self.authority, "Pooled TLS connection stale, reconnecting");
                }
            }
        }

        let mut stream = self.connect_new(addr, timeout).await?;
        let response_bytes = self
            .send_on_stream(&mut stream, message_bytes, timeout)
            .await?;

        debug!(
            server = %self.authority,
            response_len = response_bytes.len(),
            "TLS response received"
        );

        self.return_to_pool(addr, stream);

        Ok(TransportResponse {
            bytes: response_bytes,
            protocol_used: "TLS",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TLS"
    }
}
