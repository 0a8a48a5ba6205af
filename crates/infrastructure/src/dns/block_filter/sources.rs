//! Fetching of list sources: HTTP(S) URLs via a shared client, local
//! paths via the filesystem.

use std::time::Duration;
use warden_dns_domain::DnsError;

pub struct ListFetcher {
    http: reqwest::Client,
}

impl ListFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("warden-dns/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }

    /// Fetches one source to its raw text. A source is a URL when it
    /// has an http scheme, a file path otherwise.
    pub async fn fetch(&self, source: &str) -> Result<String, DnsError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let response =
                self.http
                    .get(source)
                    .send()
                    .await
                    .map_err(|e| DnsError::ListFetch {
                        source_name: source.to_string(),
                        reason: e.to_string(),
                    })?;

            if !response.status().is_success() {
                return Err(DnsError::ListFetch {
                    source_name: source.to_string(),
                    reason: format!("HTTP {}", response.status().as_u16()),
                });
            }

            response.text().await.map_err(|e| DnsError::ListFetch {
                source_name: source.to_string(),
                reason: e.to_string(),
            })
        } else {
            tokio::fs::read_to_string(source)
                .await
                .map_err(|e| DnsError::ListFetch {
                    source_name: source.to_string(),
                    reason: e.to_string(),
                })
        }
    }
}

impl Default for ListFetcher {
    fn default() -> Self {
        Self::new()
    }
}
