//! Conditional-forwarding stage: zone matching and the per-request
//! upstream override.

mod helpers;

use async_trait::async_trait;
use helpers::requests::make_request;
use hickory_proto::rr::RecordType;
use std::sync::{Arc, Mutex};
use warden_dns_application::ports::Resolver;
use warden_dns_domain::{
    DnsError, DnsRequest, DnsResponse, ResponseKind, Upstream,
};
use warden_dns_infrastructure::dns::message;
use warden_dns_infrastructure::dns::resolver::ConditionalForwarderResolver;

/// Records the override each request carried when it arrived here.
struct CapturingResolver {
    seen_overrides: Mutex<Vec<Option<Vec<Upstream>>>>,
}

impl CapturingResolver {
    fn new() -> Self {
        Self {
            seen_overrides: Mutex::new(Vec::new()),
        }
    }

    fn overrides(&self) -> Vec<Option<Vec<Upstream>>> {
        self.seen_overrides.lock().unwrap().clone()
    }
}

#[async_trait]
impl Resolver for CapturingResolver {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        self.seen_overrides
            .lock()
            .unwrap()
            .push(request.upstream_override.as_ref().map(|u| u.as_ref().clone()));
        Ok(DnsResponse::new(
            message::nxdomain_message(&request.message),
            ResponseKind::Resolved,
            "capture",
        ))
    }

    fn name(&self) -> &'static str {
        "capture"
    }
}

fn upstreams(raw: &[&str]) -> Vec<Upstream> {
    raw.iter().map(|s| s.parse().unwrap()).collect()
}

#[tokio::test]
async fn zone_match_overrides_the_upstream_set() {
    let capture = Arc::new(CapturingResolver::new());
    let stage = ConditionalForwarderResolver::new(
        Arc::clone(&capture) as Arc<dyn Resolver>,
        vec![("fritz.box".to_string(), upstreams(&["udp:192.168.178.1"]))],
    );

    let mut req = make_request("nas.fritz.box.", RecordType::A);
    stage.resolve(&mut req).await.unwrap();

    let seen = capture.overrides();
    let expected = upstreams(&["udp:192.168.178.1"]);
    assert_eq!(seen, vec![Some(expected)]);
}

#[tokio::test]
async fn exact_zone_name_matches_too() {
    let capture = Arc::new(CapturingResolver::new());
    let stage = ConditionalForwarderResolver::new(
        Arc::clone(&capture) as Arc<dyn Resolver>,
        vec![("fritz.box".to_string(), upstreams(&["udp:192.168.178.1"]))],
    );

    let mut req = make_request("fritz.box.", RecordType::A);
    stage.resolve(&mut req).await.unwrap();

    assert!(capture.overrides()[0].is_some());
}

#[tokio::test]
async fn unrelated_names_keep_the_global_set() {
    let capture = Arc::new(CapturingResolver::new());
    let stage = ConditionalForwarderResolver::new(
        Arc::clone(&capture) as Arc<dyn Resolver>,
        vec![("fritz.box".to_string(), upstreams(&["udp:192.168.178.1"]))],
    );

    // A suffix of the labels is not enough; label boundaries count.
    for name in ["example.com.", "notfritz.box.", "fritz.boxy."] {
        let mut req = make_request(name, RecordType::A);
        stage.resolve(&mut req).await.unwrap();
    }

    assert_eq!(capture.overrides(), vec![None, None, None]);
}

#[tokio::test]
async fn longest_suffix_wins() {
    let capture = Arc::new(CapturingResolver::new());
    let stage = ConditionalForwarderResolver::new(
        Arc::clone(&capture) as Arc<dyn Resolver>,
        vec![
            ("box".to_string(), upstreams(&["udp:10.0.0.1"])),
            ("fritz.box".to_string(), upstreams(&["udp:10.0.0.2"])),
        ],
    );

    let mut req = make_request("nas.fritz.box.", RecordType::A);
    stage.resolve(&mut req).await.unwrap();

    let seen = capture.overrides();
    assert_eq!(seen[0].as_ref().unwrap()[0].host, "10.0.0.2");
}

#[tokio::test]
async fn matching_is_case_insensitive() {
    let capture = Arc::new(CapturingResolver::new());
    let stage = ConditionalForwarderResolver::new(
        Arc::clone(&capture) as Arc<dyn Resolver>,
        vec![("fritz.box".to_string(), upstreams(&["udp:192.168.178.1"]))],
    );

    let mut req = make_request("NAS.Fritz.Box.", RecordType::A);
    stage.resolve(&mut req).await.unwrap();
    assert!(capture.overrides()[0].is_some());
}
