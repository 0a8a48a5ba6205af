//! Custom-DNS stage: static mappings answer locally, everything else
//! passes through.

mod helpers;

use helpers::mock_resolver::MockResolver;
use helpers::requests::make_request;
use hickory_proto::rr::{RData, RecordType};
use std::net::IpAddr;
use std::sync::Arc;
use warden_dns_application::ports::Resolver;
use warden_dns_domain::ResponseKind;
use warden_dns_infrastructure::dns::resolver::CustomDnsResolver;

fn mapping(entries: &[(&str, &str)]) -> Vec<(String, Vec<IpAddr>)> {
    entries
        .iter()
        .map(|(name, ip)| (name.to_string(), vec![ip.parse().unwrap()]))
        .collect()
}

#[tokio::test]
async fn mapped_a_query_is_answered_locally() {
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = CustomDnsResolver::new(
        Arc::clone(&mock) as Arc<dyn Resolver>,
        mapping(&[("my.duckdns.org", "192.168.178.3")]),
        3600,
    );

    let mut req = make_request("my.duckdns.org.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();

    assert_eq!(response.kind, ResponseKind::CustomDns);
    let answers = response.message.answers();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].ttl(), 3600);
    match answers[0].data() {
        RData::A(a) => assert_eq!(a.0.to_string(), "192.168.178.3"),
        other => panic!("expected A record, got {other:?}"),
    }
    assert_eq!(mock.call_count(), 0, "custom answer must not go upstream");
    assert_eq!(response.message.queries(), req.message.queries());
}

#[tokio::test]
async fn family_mismatch_passes_through() {
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = CustomDnsResolver::new(
        Arc::clone(&mock) as Arc<dyn Resolver>,
        mapping(&[("my.duckdns.org", "192.168.178.3")]),
        3600,
    );

    // AAAA asked, only an IPv4 mapping exists.
    let mut req = make_request("my.duckdns.org.", RecordType::AAAA);
    let response = stage.resolve(&mut req).await.unwrap();

    assert_eq!(response.kind, ResponseKind::Resolved);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn non_address_types_pass_through() {
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = CustomDnsResolver::new(
        Arc::clone(&mock) as Arc<dyn Resolver>,
        mapping(&[("my.duckdns.org", "192.168.178.3")]),
        3600,
    );

    let mut req = make_request("my.duckdns.org.", RecordType::TXT);
    stage.resolve(&mut req).await.unwrap();
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn wildcard_mapping_matches_subdomains() {
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = CustomDnsResolver::new(
        Arc::clone(&mock) as Arc<dyn Resolver>,
        mapping(&[("*.lan.example", "10.0.0.42")]),
        3600,
    );

    let mut req = make_request("printer.lan.example.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();
    assert_eq!(response.kind, ResponseKind::CustomDns);

    // The bare suffix itself is not covered by the wildcard.
    let mut req = make_request("lan.example.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();
    assert_eq!(response.kind, ResponseKind::Resolved);
}

#[tokio::test]
async fn lookup_is_case_insensitive() {
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = CustomDnsResolver::new(
        Arc::clone(&mock) as Arc<dyn Resolver>,
        mapping(&[("my.duckdns.org", "192.168.178.3")]),
        3600,
    );

    let mut req = make_request("MY.DuckDNS.org.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();
    assert_eq!(response.kind, ResponseKind::CustomDns);
    assert_eq!(mock.call_count(), 0);
}
