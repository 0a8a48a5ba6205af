//! Blocking stage behavior: group resolution, allow-over-deny, block
//! response synthesis, and normalization stability.

mod helpers;

use helpers::mock_resolver::MockResolver;
use helpers::requests::make_request_from;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{RData, RecordType};
use std::collections::HashMap;
use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use warden_dns_application::ports::Resolver;
use warden_dns_domain::config::BlockType;
use warden_dns_domain::{ClientGroups, DnsRequest, ResponseKind};
use warden_dns_infrastructure::dns::block_filter::BlockingEngine;
use warden_dns_infrastructure::dns::resolver::BlockingResolver;

const CLIENT: &str = "192.168.178.20:53001";

fn write_list(lines: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(lines.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn sources(group: &str, file: &tempfile::NamedTempFile) -> HashMap<String, Vec<String>> {
    HashMap::from([(
        group.to_string(),
        vec![file.path().to_str().unwrap().to_string()],
    )])
}

fn default_groups() -> Arc<ClientGroups> {
    let mapping = HashMap::from([("default".to_string(), vec!["default".to_string()])]);
    Arc::new(ClientGroups::from_config(&mapping).unwrap())
}

async fn blocking_stage(
    deny: &tempfile::NamedTempFile,
    allow: Option<&tempfile::NamedTempFile>,
    block_type: BlockType,
    custom_ips: Vec<IpAddr>,
    mock: Arc<MockResolver>,
) -> BlockingResolver {
    let engine = BlockingEngine::new(
        sources("default", deny),
        allow.map(|f| sources("default", f)).unwrap_or_default(),
    )
    .await
    .unwrap();

    BlockingResolver::new(
        mock,
        Arc::new(engine),
        default_groups(),
        block_type,
        600,
        custom_ips,
    )
}

fn request(name: &str, record_type: RecordType) -> DnsRequest {
    make_request_from(name, record_type, CLIENT.parse::<SocketAddr>().unwrap())
}

#[tokio::test]
async fn denied_a_query_gets_zero_ip_and_no_upstream_call() {
    let deny = write_list("ads.example\n");
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = blocking_stage(&deny, None, BlockType::ZeroIp, vec![], Arc::clone(&mock)).await;

    let mut req = request("ads.example.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();

    assert_eq!(response.kind, ResponseKind::Blocked);
    assert_eq!(response.message.response_code(), ResponseCode::NoError);
    let answers = response.message.answers();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].ttl(), 600);
    match answers[0].data() {
        RData::A(a) => assert_eq!(a.0, std::net::Ipv4Addr::UNSPECIFIED),
        other => panic!("expected A record, got {other:?}"),
    }
    assert_eq!(mock.call_count(), 0, "blocked query must not go upstream");

    // Question section unchanged, QR set.
    assert_eq!(response.message.queries(), req.message.queries());
    assert_eq!(response.message.id(), req.message.id());
}

#[tokio::test]
async fn denied_aaaa_query_gets_zero_ipv6() {
    let deny = write_list("ads.example\n");
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = blocking_stage(&deny, None, BlockType::ZeroIp, vec![], mock).await;

    let mut req = request("ads.example.", RecordType::AAAA);
    let response = stage.resolve(&mut req).await.unwrap();

    match response.message.answers()[0].data() {
        RData::AAAA(aaaa) => assert_eq!(aaaa.0, std::net::Ipv6Addr::UNSPECIFIED),
        other => panic!("expected AAAA record, got {other:?}"),
    }
}

#[tokio::test]
async fn decision_is_stable_under_case_and_trailing_dot() {
    let deny = write_list("ads.example\n");
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = blocking_stage(&deny, None, BlockType::ZeroIp, vec![], Arc::clone(&mock)).await;

    for spelling in ["ADS.EXAMPLE.", "Ads.Example", "ads.example."] {
        let mut req = request(spelling, RecordType::A);
        let response = stage.resolve(&mut req).await.unwrap();
        assert_eq!(
            response.kind,
            ResponseKind::Blocked,
            "spelling '{spelling}' must be blocked"
        );
    }
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn allow_list_overrides_deny_list() {
    let deny = write_list("safe.example\nads.example\n");
    let allow = write_list("safe.example\n");
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = blocking_stage(
        &deny,
        Some(&allow),
        BlockType::ZeroIp,
        vec![],
        Arc::clone(&mock),
    )
    .await;

    let mut req = request("safe.example.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();

    assert_eq!(response.kind, ResponseKind::Resolved);
    assert_eq!(mock.call_count(), 1, "allow-listed query goes upstream");
}

#[tokio::test]
async fn nxdomain_block_type() {
    let deny = write_list("ads.example\n");
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = blocking_stage(&deny, None, BlockType::NxDomain, vec![], mock).await;

    let mut req = request("ads.example.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();

    assert_eq!(response.kind, ResponseKind::Blocked);
    assert_eq!(response.message.response_code(), ResponseCode::NXDomain);
    assert!(response.message.answers().is_empty());
}

#[tokio::test]
async fn custom_block_type_answers_configured_ips() {
    let deny = write_list("ads.example\n");
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let custom: Vec<IpAddr> = vec!["10.10.10.10".parse().unwrap(), "fd00::1".parse().unwrap()];
    let stage = blocking_stage(&deny, None, BlockType::Custom, custom, mock).await;

    let mut req = request("ads.example.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();

    // Only the matching family is answered.
    let answers = response.message.answers();
    assert_eq!(answers.len(), 1);
    match answers[0].data() {
        RData::A(a) => assert_eq!(a.0.to_string(), "10.10.10.10"),
        other => panic!("expected A record, got {other:?}"),
    }
}

#[tokio::test]
async fn unlisted_names_are_forwarded() {
    let deny = write_list("ads.example\n");
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));
    let stage = blocking_stage(&deny, None, BlockType::ZeroIp, vec![], Arc::clone(&mock)).await;

    let mut req = request("fine.example.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();

    assert_eq!(response.kind, ResponseKind::Resolved);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn client_outside_any_group_is_never_blocked() {
    let deny = write_list("ads.example\n");
    let mock = Arc::new(MockResolver::answering("5.5.5.5", 60));

    let engine = BlockingEngine::new(sources("kids", &deny), HashMap::new())
        .await
        .unwrap();
    // Group table assigns the 'kids' group only to 10.0.0.0/8.
    let mapping = HashMap::from([("10.0.0.0/8".to_string(), vec!["kids".to_string()])]);
    let groups = Arc::new(ClientGroups::from_config(&mapping).unwrap());

    let stage = BlockingResolver::new(
        Arc::clone(&mock) as Arc<dyn Resolver>,
        Arc::new(engine),
        groups,
        BlockType::ZeroIp,
        600,
        vec![],
    );

    // 192.168.x client matches no assignment and there is no default.
    let mut req = request("ads.example.", RecordType::A);
    let response = stage.resolve(&mut req).await.unwrap();
    assert_eq!(response.kind, ResponseKind::Resolved);

    // A 10.x client is in 'kids' and gets blocked.
    let mut req = make_request_from(
        "ads.example.",
        RecordType::A,
        "10.1.2.3:5000".parse().unwrap(),
    );
    let response = stage.resolve(&mut req).await.unwrap();
    assert_eq!(response.kind, ResponseKind::Blocked);
    assert_eq!(req.client_groups, vec!["kids".to_string()]);
}
