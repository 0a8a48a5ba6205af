use serde::{Deserialize, Serialize};

/// The `prometheus` config section. The exporter itself lives outside
/// this crate; the chain only surfaces these values through stage
/// configuration output and feeds the stats registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enable: bool,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enable: false,
            port: default_port(),
            path: default_path(),
        }
    }
}

fn default_port() -> u16 {
    4000
}

fn default_path() -> String {
    "/metrics".to_string()
}
