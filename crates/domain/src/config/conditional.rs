use crate::upstream::{parse_upstream_list, Upstream};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The `conditional` config section: DNS zone suffix → upstream set.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ConditionalConfig {
    /// Zone suffix to a comma-separated list of upstream strings.
    #[serde(default)]
    pub mapping: HashMap<String, String>,
}

impl ConditionalConfig {
    /// Parses the raw mapping into (zone, upstreams) rules.
    pub fn parsed_mapping(&self) -> Result<Vec<(String, Vec<Upstream>)>, String> {
        let mut rules = Vec::with_capacity(self.mapping.len());
        for (zone, raw) in &self.mapping {
            let upstreams = parse_upstream_list(raw)
                .map_err(|e| format!("conditional mapping for '{zone}': {e}"))?;
            if upstreams.is_empty() {
                return Err(format!("conditional mapping for '{zone}' has no upstreams"));
            }
            let zone = zone.trim_end_matches('.').to_ascii_lowercase();
            rules.push((zone, upstreams));
        }
        Ok(rules)
    }
}
