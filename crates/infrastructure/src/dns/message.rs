//! Construction and inspection helpers for DNS messages.
//!
//! Every synthesized response preserves the request's ID and question
//! section and sets QR=1 RA=1; only the answer section and RCODE differ
//! between producers.

use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::IpAddr;
use warden_dns_domain::DnsError;

/// Response skeleton echoing the request's ID, question and RD flag.
pub fn response_template(request: &Message) -> Message {
    let mut response = Message::new();
    response.set_id(request.id());
    response.set_message_type(MessageType::Response);
    response.set_op_code(OpCode::Query);
    response.set_recursion_desired(request.recursion_desired());
    response.set_recursion_available(true);
    for query in request.queries() {
        response.add_query(query.clone());
    }
    response
}

/// NOERROR response carrying the given answers.
pub fn answer_message(request: &Message, answers: Vec<Record>) -> Message {
    let mut response = response_template(request);
    response.set_response_code(ResponseCode::NoError);
    response.insert_answers(answers);
    response
}

/// NXDOMAIN response with an empty answer section.
pub fn nxdomain_message(request: &Message) -> Message {
    let mut response = response_template(request);
    response.set_response_code(ResponseCode::NXDomain);
    response
}

/// SERVFAIL response; the dispatcher's answer of last resort.
pub fn servfail_message(request: &Message) -> Message {
    let mut response = response_template(request);
    response.set_response_code(ResponseCode::ServFail);
    response
}

/// FORMERR wire bytes for an unparseable query. Needs at least the two
/// ID bytes to echo; returns `None` otherwise.
pub fn formerr_bytes(raw: &[u8]) -> Option<Vec<u8>> {
    if raw.len() < 2 {
        return None;
    }
    let id = u16::from_be_bytes([raw[0], raw[1]]);
    let mut response = Message::new();
    response.set_id(id);
    response.set_message_type(MessageType::Response);
    response.set_op_code(OpCode::Query);
    response.set_recursion_available(true);
    response.set_response_code(ResponseCode::FormErr);
    response.to_vec().ok()
}

/// Builds A/AAAA records for the IPs matching the asked record family.
pub fn address_records(name: &Name, qtype: RecordType, ips: &[IpAddr], ttl: u32) -> Vec<Record> {
    ips.iter()
        .filter_map(|ip| match (qtype, ip) {
            (RecordType::A, IpAddr::V4(v4)) => {
                Some(Record::from_rdata(name.clone(), ttl, RData::A(rdata::A(*v4))))
            }
            (RecordType::AAAA, IpAddr::V6(v6)) => {
                Some(Record::from_rdata(name.clone(), ttl, RData::AAAA(rdata::AAAA(*v6))))
            }
            _ => None,
        })
        .collect()
}

/// Smallest TTL in the answer section.
pub fn min_answer_ttl(message: &Message) -> Option<u32> {
    message.answers().iter().map(Record::ttl).min()
}

/// MINIMUM field of the first SOA in the authority section, the basis
/// for negative-response TTLs.
pub fn soa_minimum(message: &Message) -> Option<u32> {
    message.name_servers().iter().find_map(|record| {
        if let RData::SOA(soa) = record.data() {
            Some(soa.minimum())
        } else {
            None
        }
    })
}

/// True for NXDOMAIN and NODATA responses.
pub fn is_negative(message: &Message) -> bool {
    match message.response_code() {
        ResponseCode::NXDomain => true,
        ResponseCode::NoError => message.answers().is_empty(),
        _ => false,
    }
}

/// Clones records with TTLs reduced by `elapsed_secs`, floored at zero.
pub fn records_with_decremented_ttl(records: &[Record], elapsed_secs: u64) -> Vec<Record> {
    records
        .iter()
        .map(|record| {
            let mut adjusted = record.clone();
            let remaining = record.ttl().saturating_sub(elapsed_secs.min(u32::MAX as u64) as u32);
            adjusted.set_ttl(remaining);
            adjusted
        })
        .collect()
}

pub fn rcode_str(code: ResponseCode) -> &'static str {
    match code {
        ResponseCode::NoError => "NOERROR",
        ResponseCode::NXDomain => "NXDOMAIN",
        ResponseCode::ServFail => "SERVFAIL",
        ResponseCode::Refused => "REFUSED",
        ResponseCode::NotImp => "NOTIMP",
        ResponseCode::FormErr => "FORMERR",
        _ => "UNKNOWN",
    }
}

/// Parses client wire bytes into a message, surfacing malformed input
/// as the error kind the listener answers with FORMERR.
pub fn parse_request(raw: &[u8]) -> Result<Message, DnsError> {
    Message::from_vec(raw).map_err(|e| DnsError::RequestMalformed(e.to_string()))
}
