use warden_dns_domain::{Upstream, UpstreamKind};

struct Case {
    name: &'static str,
    input: &'static str,
    want: Option<Upstream>,
}

fn upstream(net: UpstreamKind, host: &str, port: u16, path: &str) -> Upstream {
    Upstream {
        net,
        host: host.to_string(),
        port,
        path: path.to_string(),
    }
}

#[test]
fn parse_table() {
    let cases = [
        Case {
            name: "udpWithPort",
            input: "udp:4.4.4.4:531",
            want: Some(upstream(UpstreamKind::Udp, "4.4.4.4", 531, "")),
        },
        Case {
            name: "udpDefault",
            input: "udp:4.4.4.4",
            want: Some(upstream(UpstreamKind::Udp, "4.4.4.4", 53, "")),
        },
        Case {
            name: "tcpWithPort",
            input: "tcp:4.4.4.4:4711",
            want: Some(upstream(UpstreamKind::Tcp, "4.4.4.4", 4711, "")),
        },
        Case {
            name: "tcpDefault",
            input: "tcp:4.4.4.4",
            want: Some(upstream(UpstreamKind::Tcp, "4.4.4.4", 53, "")),
        },
        Case {
            name: "tcpTlsDefault",
            input: "tcp-tls:4.4.4.4",
            want: Some(upstream(UpstreamKind::TcpTls, "4.4.4.4", 853, "")),
        },
        Case {
            name: "dohDefault",
            input: "https:4.4.4.4",
            want: Some(upstream(UpstreamKind::Https, "4.4.4.4", 443, "")),
        },
        Case {
            name: "dohWithPort",
            input: "https:4.4.4.4:888",
            want: Some(upstream(UpstreamKind::Https, "4.4.4.4", 888, "")),
        },
        Case {
            name: "dohNamed",
            input: "https://dns.google/dns-query",
            want: Some(upstream(UpstreamKind::Https, "dns.google", 443, "/dns-query")),
        },
        Case {
            name: "dohNamedMultiSlash",
            input: "https://dns.google/dns-query/a/b",
            want: Some(upstream(
                UpstreamKind::Https,
                "dns.google",
                443,
                "/dns-query/a/b",
            )),
        },
        Case {
            name: "dohNamedWithPort",
            input: "https://dns.google:888/dns-query",
            want: Some(upstream(UpstreamKind::Https, "dns.google", 888, "/dns-query")),
        },
        Case {
            name: "empty",
            input: "",
            want: Some(Upstream::default()),
        },
        Case {
            name: "bareIp",
            input: "8.8.8.8",
            want: Some(upstream(UpstreamKind::Udp, "8.8.8.8", 53, "")),
        },
        Case {
            name: "withoutHost",
            input: "tcp::53",
            want: None,
        },
        Case {
            name: "withoutNet",
            input: ":1.1.1.1:53",
            want: None,
        },
        Case {
            name: "negativePort",
            input: "tcp:4.4.4.4:-1",
            want: None,
        },
        Case {
            name: "invalidPort",
            input: "tcp:4.4.4.4:65536",
            want: None,
        },
        Case {
            name: "zeroPort",
            input: "tcp:4.4.4.4:0",
            want: None,
        },
        Case {
            name: "notNumericPort",
            input: "tcp:4.4.4.4:A53",
            want: None,
        },
        Case {
            name: "wrongProtocol",
            input: "bla:4.4.4.4:53",
            want: None,
        },
        Case {
            name: "wrongFormat",
            input: "tcp-4.4.4.4",
            want: None,
        },
    ];

    for case in &cases {
        let result: Result<Upstream, _> = case.input.parse();
        match &case.want {
            Some(want) => {
                let got = result
                    .unwrap_or_else(|e| panic!("{}: expected success, got {e}", case.name));
                assert_eq!(&got, want, "{}", case.name);
            }
            None => assert!(result.is_err(), "{}: expected error", case.name),
        }
    }
}

#[test]
fn display_round_trips() {
    let inputs = [
        "udp:4.4.4.4:531",
        "udp:8.8.8.8",
        "tcp:4.4.4.4:4711",
        "tcp-tls:4.4.4.4",
        "https:4.4.4.4:888",
        "https://dns.google/dns-query",
        "https://dns.google:888/dns-query",
        "https://dns.google/dns-query/a/b",
    ];

    for input in inputs {
        let parsed: Upstream = input.parse().unwrap();
        let reparsed: Upstream = parsed.to_string().parse().unwrap();
        assert_eq!(parsed, reparsed, "round trip for '{input}'");
    }
}

#[test]
fn unspecified_upstream_displays_empty() {
    let u = Upstream::default();
    assert!(u.is_unspecified());
    assert_eq!(u.to_string(), "");
}
