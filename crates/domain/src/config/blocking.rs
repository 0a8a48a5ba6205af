use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// What the blocking stage answers for a denied name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum BlockType {
    /// A → 0.0.0.0, AAAA → ::
    #[serde(rename = "zeroIP")]
    #[default]
    ZeroIp,
    /// NXDOMAIN with an empty answer section.
    #[serde(rename = "nxDomain")]
    NxDomain,
    /// The configured `customIPs`, filtered by record family.
    #[serde(rename = "custom")]
    Custom,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroIp => "zeroIP",
            Self::NxDomain => "nxDomain",
            Self::Custom => "custom",
        }
    }
}

/// The `blocking` config section: deny/allow list sources per group,
/// client → group assignment, and block response shape.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockingConfig {
    /// Group name → deny list sources (URLs or file paths).
    #[serde(rename = "blackLists", default)]
    pub black_lists: HashMap<String, Vec<String>>,

    /// Group name → allow list sources.
    #[serde(rename = "whiteLists", default)]
    pub white_lists: HashMap<String, Vec<String>>,

    /// Client selector (IP, CIDR or name pattern) → group names.
    #[serde(rename = "clientGroupsBlock", default)]
    pub client_groups_block: HashMap<String, Vec<String>>,

    #[serde(rename = "blockType", default)]
    pub block_type: BlockType,

    /// TTL of synthesized block answers, in seconds.
    #[serde(rename = "blockTTL", default = "default_block_ttl")]
    pub block_ttl: u32,

    /// IPs answered when `blockType` is `custom`.
    #[serde(rename = "customIPs", default)]
    pub custom_ips: Vec<IpAddr>,

    /// Minutes between list refreshes; 0 disables periodic refresh.
    #[serde(rename = "refreshPeriod", default = "default_refresh_period")]
    pub refresh_period: u64,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            black_lists: HashMap::new(),
            white_lists: HashMap::new(),
            client_groups_block: HashMap::new(),
            block_type: BlockType::default(),
            block_ttl: default_block_ttl(),
            custom_ips: Vec::new(),
            refresh_period: default_refresh_period(),
        }
    }
}

impl BlockingConfig {
    pub fn enabled(&self) -> bool {
        !self.black_lists.is_empty() || !self.white_lists.is_empty()
    }
}

fn default_block_ttl() -> u32 {
    21_600
}

fn default_refresh_period() -> u64 {
    240
}
