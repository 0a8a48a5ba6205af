use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use std::net::SocketAddr;
use std::str::FromStr;
use warden_dns_domain::{DnsRequest, ListenerProtocol};

pub fn query_message(name: &str, record_type: RecordType) -> Message {
    let mut query = Query::new();
    query.set_name(Name::from_str(name).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new();
    message.set_id(fastrand::u16(..));
    message.set_message_type(MessageType::Query);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);
    message
}

pub fn make_request(name: &str, record_type: RecordType) -> DnsRequest {
    make_request_from(name, record_type, "127.0.0.1:40000".parse().unwrap())
}

pub fn make_request_from(
    name: &str,
    record_type: RecordType,
    client_addr: SocketAddr,
) -> DnsRequest {
    DnsRequest::new(
        query_message(name, record_type),
        client_addr,
        ListenerProtocol::Udp,
    )
}
