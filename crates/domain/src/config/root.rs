use serde::{Deserialize, Serialize};

use super::blocking::BlockingConfig;
use super::caching::CachingConfig;
use super::client_lookup::ClientLookupConfig;
use super::conditional::ConditionalConfig;
use super::custom_dns::CustomDnsConfig;
use super::errors::ConfigError;
use super::prometheus::PrometheusConfig;
use super::upstream::UpstreamConfig;
use crate::client_groups::ClientGroups;

/// Main configuration structure for Warden DNS.
///
/// Key names are part of the external interface and stay camelCase in
/// the YAML file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// UDP/TCP listener port.
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(rename = "logLevel", default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(rename = "customDNS", default)]
    pub custom_dns: CustomDnsConfig,

    #[serde(default)]
    pub conditional: ConditionalConfig,

    #[serde(default)]
    pub blocking: BlockingConfig,

    #[serde(default)]
    pub caching: CachingConfig,

    #[serde(rename = "clientLookup", default)]
    pub client_lookup: ClientLookupConfig,

    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

impl Config {
    /// Loads and validates the configuration from a YAML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        let config: Config =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything that must be fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Validation("port must not be 0".to_string()));
        }

        if self.upstream.external_resolvers.is_empty() {
            return Err(ConfigError::Validation(
                "upstream.externalResolvers must not be empty".to_string(),
            ));
        }
        if self
            .upstream
            .external_resolvers
            .iter()
            .any(|u| u.is_unspecified())
        {
            return Err(ConfigError::Validation(
                "upstream.externalResolvers contains an empty entry".to_string(),
            ));
        }
        if self.upstream.resolver_count == 0 {
            return Err(ConfigError::Validation(
                "upstream.resolverCount must be at least 1".to_string(),
            ));
        }

        self.custom_dns
            .parsed_mapping()
            .map_err(ConfigError::Validation)?;
        self.conditional
            .parsed_mapping()
            .map_err(ConfigError::Validation)?;
        ClientGroups::from_config(&self.blocking.client_groups_block)
            .map_err(ConfigError::Validation)?;

        if self.blocking.block_type == super::blocking::BlockType::Custom
            && self.blocking.custom_ips.is_empty()
        {
            return Err(ConfigError::Validation(
                "blocking.blockType 'custom' requires blocking.customIPs".to_string(),
            ));
        }

        for (group, groups) in [
            ("blackLists", &self.blocking.black_lists),
            ("whiteLists", &self.blocking.white_lists),
        ] {
            for (name, sources) in groups {
                if sources.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "blocking.{group} group '{name}' has no sources"
                    )));
                }
            }
        }

        for position in &self.client_lookup.single_name_order {
            if *position == 0 {
                return Err(ConfigError::Validation(
                    "clientLookup.singleNameOrder positions are 1-based".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn default_port() -> u16 {
    53
}

fn default_log_level() -> String {
    "info".to_string()
}
