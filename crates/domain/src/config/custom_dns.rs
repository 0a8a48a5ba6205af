use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// The `customDNS` config section: static name → IP overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CustomDnsConfig {
    /// Name (exact or `*.suffix`) to one or more comma-separated IPs.
    #[serde(default)]
    pub mapping: HashMap<String, String>,

    /// TTL of synthesized answers, in seconds.
    #[serde(rename = "customTTL", default = "default_custom_ttl")]
    pub custom_ttl: u32,
}

impl CustomDnsConfig {
    /// Parses the raw mapping values into IP lists.
    pub fn parsed_mapping(&self) -> Result<Vec<(String, Vec<IpAddr>)>, String> {
        let mut entries = Vec::with_capacity(self.mapping.len());
        for (name, raw_ips) in &self.mapping {
            let mut ips = Vec::new();
            for raw in raw_ips.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let ip: IpAddr = raw
                    .parse()
                    .map_err(|e| format!("customDNS mapping for '{name}': bad IP '{raw}': {e}"))?;
                ips.push(ip);
            }
            if ips.is_empty() {
                return Err(format!("customDNS mapping for '{name}' has no IPs"));
            }
            entries.push((name.to_ascii_lowercase(), ips));
        }
        Ok(entries)
    }
}

fn default_custom_ttl() -> u32 {
    3600
}
