use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata;
use hickory_proto::rr::{RData, Record};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// Behavior of a loopback UDP upstream used by dispatcher tests.
#[derive(Clone)]
pub struct MockBehavior {
    pub delay: Duration,
    pub answer_ip: Ipv4Addr,
    pub response_code: ResponseCode,
    pub ttl: u32,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            answer_ip: Ipv4Addr::new(93, 184, 216, 34),
            response_code: ResponseCode::NoError,
            ttl: 60,
        }
    }
}

impl MockBehavior {
    pub fn answering(ip: Ipv4Addr) -> Self {
        Self {
            answer_ip: ip,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn servfail() -> Self {
        Self {
            response_code: ResponseCode::ServFail,
            ..Self::default()
        }
    }
}

pub struct MockDnsServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    queries: Arc<AtomicUsize>,
}

impl MockDnsServer {
    /// Binds an ephemeral loopback port and answers every query per the
    /// behavior.
    pub async fn start(behavior: MockBehavior) -> (Self, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let local_addr = socket.local_addr().unwrap();
        let queries = Arc::new(AtomicUsize::new(0));

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let query_counter = Arc::clone(&queries);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { break };
                        query_counter.fetch_add(1, Ordering::SeqCst);

                        if !behavior.delay.is_zero() {
                            tokio::time::sleep(behavior.delay).await;
                        }

                        if let Some(response) = Self::build_response(&buf[..len], &behavior) {
                            let _ = socket.send_to(&response, peer).await;
                        }
                    }
                }
            }
        });

        (
            Self {
                addr: local_addr,
                shutdown_tx: Some(shutdown_tx),
                queries,
            },
            local_addr,
        )
    }

    fn build_response(query: &[u8], behavior: &MockBehavior) -> Option<Vec<u8>> {
        let query = Message::from_vec(query).ok()?;

        let mut response = Message::new();
        response.set_id(query.id());
        response.set_message_type(MessageType::Response);
        response.set_op_code(hickory_proto::op::OpCode::Query);
        response.set_recursion_desired(query.recursion_desired());
        response.set_recursion_available(true);
        response.set_response_code(behavior.response_code);

        for q in query.queries() {
            response.add_query(q.clone());
        }

        if behavior.response_code == ResponseCode::NoError {
            if let Some(q) = query.queries().first() {
                response.add_answer(Record::from_rdata(
                    q.name().clone(),
                    behavior.ttl,
                    RData::A(rdata::A(behavior.answer_ip)),
                ));
            }
        }

        response.to_vec().ok()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
