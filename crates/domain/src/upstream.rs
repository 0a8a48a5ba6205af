use crate::errors::DnsError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Transport used to reach an upstream DNS server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpstreamKind {
    #[default]
    Udp,
    Tcp,
    TcpTls,
    Https,
}

impl UpstreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
            Self::TcpTls => "tcp-tls",
            Self::Https => "https",
        }
    }

    /// Well-known port for this transport.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Udp | Self::Tcp => 53,
            Self::TcpTls => 853,
            Self::Https => 443,
        }
    }
}

/// One upstream DNS server: transport, host, port and (for DoH) URL path.
///
/// The canonical string forms are
/// `udp:HOST[:PORT]`, `tcp:HOST[:PORT]`, `tcp-tls:HOST[:PORT]`,
/// `https:HOST[:PORT]` and `https://HOST[:PORT]/PATH`; a bare IP literal
/// is shorthand for `udp:IP`. The empty string parses to the
/// zero-valued upstream, which signals "unspecified".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Upstream {
    pub net: UpstreamKind,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Upstream {
    pub fn new(net: UpstreamKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            net,
            host: host.into(),
            port,
            path: String::new(),
        }
    }

    /// True for the zero value produced by parsing the empty string.
    pub fn is_unspecified(&self) -> bool {
        self.host.is_empty()
    }

    /// `host:port` as used for socket addresses and breaker keys.
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Full DoH endpoint URL. Only meaningful for `https` upstreams.
    pub fn url(&self) -> String {
        let path = if self.path.is_empty() {
            "/dns-query"
        } else {
            &self.path
        };
        format!("https://{}{}", self.authority(), path)
    }
}

fn parse_port(raw: &str, input: &str) -> Result<u16, DnsError> {
    let port: u16 = raw.parse().map_err(|_| DnsError::UpstreamParse {
        input: input.to_string(),
        reason: format!("invalid port '{raw}'"),
    })?;
    if port == 0 {
        return Err(DnsError::UpstreamParse {
            input: input.to_string(),
            reason: "port must be in [1, 65535]".to_string(),
        });
    }
    Ok(port)
}

/// Splits `HOST[:PORT]`, handling bracketed and bare IPv6 hosts.
fn parse_host_port(rest: &str, net: UpstreamKind, input: &str) -> Result<(String, u16), DnsError> {
    let (host, port) = if let Some(v6) = rest.strip_prefix('[') {
        let end = v6.find(']').ok_or_else(|| DnsError::UpstreamParse {
            input: input.to_string(),
            reason: "unterminated '[' in host".to_string(),
        })?;
        let host = &v6[..end];
        match v6[end + 1..].strip_prefix(':') {
            Some(port_str) => (host.to_string(), parse_port(port_str, input)?),
            None => (host.to_string(), net.default_port()),
        }
    } else if rest.parse::<IpAddr>().is_ok() {
        // Bare IP literal; a bare IPv6 address keeps all its colons.
        (rest.to_string(), net.default_port())
    } else {
        match rest.rsplit_once(':') {
            Some((host, port_str)) => (host.to_string(), parse_port(port_str, input)?),
            None => (rest.to_string(), net.default_port()),
        }
    };

    if host.is_empty() {
        return Err(DnsError::UpstreamParse {
            input: input.to_string(),
            reason: "host must not be empty".to_string(),
        });
    }

    Ok((host, port))
}

/// `https://HOST[:PORT]/PATH` with the path preserved verbatim.
fn parse_doh_url(s: &str, rest: &str) -> Result<Upstream, DnsError> {
    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], rest[idx..].to_string()),
        None => (rest, String::new()),
    };
    let (host, port) = parse_host_port(authority, UpstreamKind::Https, s)?;
    Ok(Upstream {
        net: UpstreamKind::Https,
        host,
        port,
        path,
    })
}

impl FromStr for Upstream {
    type Err = DnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Upstream::default());
        }

        if let Some(rest) = s.strip_prefix("https://") {
            return parse_doh_url(s, rest);
        }

        // A bare IP literal is accepted as a plain UDP upstream.
        if s.parse::<IpAddr>().is_ok() {
            return Ok(Upstream::new(UpstreamKind::Udp, s, 53));
        }

        let (net_str, rest) = s.split_once(':').ok_or_else(|| DnsError::UpstreamParse {
            input: s.to_string(),
            reason: "expected NET:HOST[:PORT]".to_string(),
        })?;

        let net = match net_str {
            "udp" => UpstreamKind::Udp,
            "tcp" => UpstreamKind::Tcp,
            "tcp-tls" => UpstreamKind::TcpTls,
            "https" => UpstreamKind::Https,
            other => {
                return Err(DnsError::UpstreamParse {
                    input: s.to_string(),
                    reason: format!("unknown transport '{other}'"),
                })
            }
        };

        let (host, port) = parse_host_port(rest, net, s)?;
        Ok(Upstream {
            net,
            host,
            port,
            path: String::new(),
        })
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unspecified() {
            return Ok(());
        }
        if self.net == UpstreamKind::Https && !self.path.is_empty() {
            if self.port == self.net.default_port() {
                return write!(f, "https://{}{}", self.host, self.path);
            }
            return write!(f, "https://{}{}", self.authority(), self.path);
        }
        write!(f, "{}:{}", self.net.as_str(), self.authority())
    }
}

impl Serialize for Upstream {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Upstream {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Parses a comma-separated list of upstream strings, skipping blanks.
pub fn parse_upstream_list(raw: &str) -> Result<Vec<Upstream>, DnsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Upstream::from_str)
        .collect()
}
