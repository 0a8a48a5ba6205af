use ipnetwork::IpNetwork;
use std::collections::HashMap;
use std::net::IpAddr;

/// The group every client belongs to when nothing else matches.
pub const DEFAULT_GROUP: &str = "default";

/// A name-based client selector from the `clientGroupsBlock` table.
#[derive(Debug, Clone)]
enum ClientPattern {
    NameExact(String),
    /// `*.suffix`; only proper subdomains of the suffix match.
    NameWildcard(String),
}

/// Maps clients (by IP/CIDR or resolved name) to the blocking groups
/// that apply to them. All matching assignments contribute; `default`
/// applies when nothing matches.
#[derive(Debug, Default)]
pub struct ClientGroups {
    subnets: Vec<(IpNetwork, Vec<String>)>,
    names: Vec<(ClientPattern, Vec<String>)>,
    default_groups: Vec<String>,
}

impl ClientGroups {
    /// Builds the assignment table from the raw `clientGroupsBlock`
    /// config mapping. Unparseable selectors are rejected.
    pub fn from_config(mapping: &HashMap<String, Vec<String>>) -> Result<Self, String> {
        let mut table = ClientGroups::default();

        for (selector, groups) in mapping {
            let groups: Vec<String> = groups.clone();
            if selector == DEFAULT_GROUP {
                table.default_groups = groups;
                continue;
            }

            if let Ok(network) = selector.parse::<IpNetwork>() {
                table.subnets.push((network, groups));
                continue;
            }
            if let Ok(ip) = selector.parse::<IpAddr>() {
                let network =
                    IpNetwork::new(ip, if ip.is_ipv4() { 32 } else { 128 }).map_err(|e| {
                        format!("invalid client selector '{selector}': {e}")
                    })?;
                table.subnets.push((network, groups));
                continue;
            }

            let pattern = selector.to_ascii_lowercase();
            let pattern = match pattern.strip_prefix("*.") {
                Some(suffix) => ClientPattern::NameWildcard(suffix.to_string()),
                None => ClientPattern::NameExact(pattern),
            };
            table.names.push((pattern, groups));
        }

        // Most specific subnet first, so iteration order is stable.
        table.subnets.sort_by(|a, b| b.0.prefix().cmp(&a.0.prefix()));

        Ok(table)
    }

    /// Effective groups for a client, given its IP and resolved names.
    /// Falls back to the `default` assignment when nothing matches.
    pub fn effective_groups(&self, ip: IpAddr, client_names: &[String]) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();

        for (network, assigned) in &self.subnets {
            if network.contains(ip) {
                for g in assigned {
                    if !groups.contains(g) {
                        groups.push(g.clone());
                    }
                }
            }
        }

        for (pattern, assigned) in &self.names {
            let matched = client_names.iter().any(|name| {
                let name = name.trim_end_matches('.').to_ascii_lowercase();
                match pattern {
                    ClientPattern::NameExact(exact) => &name == exact,
                    ClientPattern::NameWildcard(suffix) => {
                        name.len() > suffix.len() && name.ends_with(&format!(".{suffix}"))
                    }
                }
            });
            if matched {
                for g in assigned {
                    if !groups.contains(g) {
                        groups.push(g.clone());
                    }
                }
            }
        }

        if groups.is_empty() {
            groups = self.default_groups.clone();
        }
        groups
    }

    pub fn is_empty(&self) -> bool {
        self.subnets.is_empty() && self.names.is_empty() && self.default_groups.is_empty()
    }
}
