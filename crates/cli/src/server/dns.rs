//! UDP and TCP listener loops feeding the resolver chain.
//!
//! Each datagram or TCP frame is handled on its own task: parse,
//! resolve through the chain under the request deadline, serialize.
//! Unparseable bytes get a FORMERR when at least the ID survives;
//! chain errors and deadline overruns get a SERVFAIL.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use warden_dns_application::ports::Resolver;
use warden_dns_domain::{DnsRequest, ListenerProtocol};
use warden_dns_infrastructure::dns::message;

/// Client UDP timeout budget (typically 5s) minus a safety margin.
const REQUEST_DEADLINE: Duration = Duration::from_millis(4500);

const MAX_UDP_QUERY_SIZE: usize = 4096;
const MAX_TCP_QUERY_SIZE: usize = 65535;

pub async fn serve(
    port: u16,
    resolver: Arc<dyn Resolver>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let udp_socket = UdpSocket::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind UDP {addr}: {e}"))?;
    let tcp_listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind TCP {addr}: {e}"))?;

    info!(address = %addr, "DNS server listening");

    let udp_socket = Arc::new(udp_socket);

    tokio::select! {
        _ = run_udp(Arc::clone(&udp_socket), Arc::clone(&resolver)) => {}
        _ = run_tcp(tcp_listener, resolver) => {}
        _ = shutdown.cancelled() => {
            info!("DNS server shutting down");
        }
    }

    Ok(())
}

async fn run_udp(socket: Arc<UdpSocket>, resolver: Arc<dyn Resolver>) {
    let mut recv_buf = [0u8; MAX_UDP_QUERY_SIZE];

    loop {
        let (n, from) = match socket.recv_from(&mut recv_buf).await {
            Ok(received) => received,
            Err(e) => {
                error!(error = %e, "UDP recv error");
                continue;
            }
        };

        let raw = recv_buf[..n].to_vec();
        let socket = Arc::clone(&socket);
        let resolver = Arc::clone(&resolver);

        tokio::spawn(async move {
            if let Some(response) =
                handle_query(resolver.as_ref(), &raw, from, ListenerProtocol::Udp).await
            {
                let _ = socket.send_to(&response, from).await;
            }
        });
    }
}

async fn run_tcp(listener: TcpListener, resolver: Arc<dyn Resolver>) {
    loop {
        let (stream, from) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "TCP accept error");
                continue;
            }
        };

        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move {
            if let Err(e) = serve_tcp_connection(stream, from, resolver).await {
                debug!(client = %from, reason = %e, "TCP connection closed");
            }
        });
    }
}

/// Handles length-prefixed queries on one connection until the client
/// closes it.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    from: SocketAddr,
    resolver: Arc<dyn Resolver>,
) -> Result<(), String> {
    loop {
        let mut len_buf = [0u8; 2];
        match stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(format!("read length: {e}")),
        }

        let query_len = u16::from_be_bytes(len_buf) as usize;
        if query_len > MAX_TCP_QUERY_SIZE {
            return Err(format!("query too large: {query_len}"));
        }

        let mut raw = vec![0u8; query_len];
        stream
            .read_exact(&mut raw)
            .await
            .map_err(|e| format!("read body: {e}"))?;

        let Some(response) =
            handle_query(resolver.as_ref(), &raw, from, ListenerProtocol::Tcp).await
        else {
            continue;
        };

        let length = (response.len() as u16).to_be_bytes();
        stream
            .write_all(&length)
            .await
            .map_err(|e| format!("write length: {e}"))?;
        stream
            .write_all(&response)
            .await
            .map_err(|e| format!("write body: {e}"))?;
        stream.flush().await.map_err(|e| format!("flush: {e}"))?;
    }
}

/// Runs one raw query through the chain and serializes the reply.
async fn handle_query(
    resolver: &dyn Resolver,
    raw: &[u8],
    from: SocketAddr,
    protocol: ListenerProtocol,
) -> Option<Vec<u8>> {
    let parsed = match message::parse_request(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(client = %from, error = %e, "Malformed query, answering FORMERR");
            return message::formerr_bytes(raw);
        }
    };

    let mut request = DnsRequest::new(parsed, from, protocol);

    match tokio::time::timeout(REQUEST_DEADLINE, resolver.resolve(&mut request)).await {
        Ok(Ok(response)) => response.message.to_vec().ok(),
        Ok(Err(e)) => {
            warn!(client = %from, error = %e, "Chain failed, answering SERVFAIL");
            message::servfail_message(&request.message).to_vec().ok()
        }
        Err(_) => {
            warn!(client = %from, "Request deadline exceeded, answering SERVFAIL");
            message::servfail_message(&request.message).to_vec().ok()
        }
    }
}
