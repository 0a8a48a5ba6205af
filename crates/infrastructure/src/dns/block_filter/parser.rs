//! List file parsing: one entry per line.
//!
//! Accepted forms: bare domains, `*.` wildcards, hosts-file lines
//! (leading IP token ignored), `/regex/` entries, and IP/CIDR literals.
//! `#` starts a comment. Unparseable lines are skipped entry by entry.

use ipnetwork::IpNetwork;
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    Exact(String),
    Wildcard(String),
    Regex(String),
    Net(IpNetwork),
}

/// Hosts-file addresses whose right-hand side is the actual entry.
fn is_hosts_addr(token: &str) -> bool {
    matches!(token, "0.0.0.0" | "127.0.0.1" | "::" | "::1")
}

/// Hostnames that appear in hosts files but are never list entries.
fn is_hosts_noise(domain: &str) -> bool {
    matches!(
        domain,
        "localhost" | "0.0.0.0" | "broadcasthost" | "ip6-localhost" | "ip6-loopback"
    )
}

pub fn parse_list_line(line: &str) -> Option<ListEntry> {
    let line = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let line = line.trim();

    if line.is_empty() {
        return None;
    }

    if line.starts_with('/') && line.ends_with('/') && line.len() > 2 {
        return Some(ListEntry::Regex(line[1..line.len() - 1].to_string()));
    }

    if let Ok(network) = line.parse::<IpNetwork>() {
        return Some(ListEntry::Net(network));
    }
    if let Ok(ip) = line.parse::<IpAddr>() {
        let prefix = if ip.is_ipv4() { 32 } else { 128 };
        return IpNetwork::new(ip, prefix).ok().map(ListEntry::Net);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() >= 2 && is_hosts_addr(parts[0]) {
        let domain = parts[1].trim_end_matches('.').to_ascii_lowercase();
        if is_hosts_noise(&domain) || !domain.contains('.') {
            return None;
        }
        return Some(ListEntry::Exact(domain));
    }

    if parts.len() == 1 {
        let token = parts[0].trim_end_matches('.').to_ascii_lowercase();
        if let Some(stripped) = token.strip_prefix("*.") {
            if stripped.contains('.') {
                return Some(ListEntry::Wildcard(token));
            }
            return None;
        }
        if token.contains('.') {
            return Some(ListEntry::Exact(token));
        }
    }

    None
}

pub fn parse_list_text(text: &str) -> Vec<ListEntry> {
    text.lines().filter_map(parse_list_line).collect()
}
