//! Conditional-forwarding chain stage.
//!
//! Questions inside a configured DNS zone have their upstream set
//! rewritten for this request only; the chain then continues, so
//! blocking and caching still apply to zone-matched queries.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use warden_dns_application::ports::Resolver;
use warden_dns_domain::{DnsError, DnsRequest, DnsResponse, Upstream};

pub struct ConditionalForwarderResolver {
    next: Arc<dyn Resolver>,
    /// (zone, upstreams), sorted by zone length descending so the first
    /// match is the longest suffix.
    rules: Vec<(String, Arc<Vec<Upstream>>)>,
}

impl ConditionalForwarderResolver {
    /// `rules` zones are lowercased without trailing dots.
    pub fn new(next: Arc<dyn Resolver>, rules: Vec<(String, Vec<Upstream>)>) -> Self {
        let mut rules: Vec<(String, Arc<Vec<Upstream>>)> = rules
            .into_iter()
            .map(|(zone, upstreams)| (zone, Arc::new(upstreams)))
            .collect();
        rules.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { next, rules }
    }

    fn matching_rule(&self, name: &str) -> Option<&(String, Arc<Vec<Upstream>>)> {
        self.rules.iter().find(|(zone, _)| {
            name == zone
                || (name.len() > zone.len()
                    && name.ends_with(zone)
                    && name.as_bytes()[name.len() - zone.len() - 1] == b'.')
        })
    }
}

#[async_trait]
impl Resolver for ConditionalForwarderResolver {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        if let Some(name) = request.normalized_name() {
            if let Some((zone, upstreams)) = self.matching_rule(&name) {
                debug!(
                    name = %name,
                    zone = %zone,
                    upstreams = upstreams.len(),
                    "Conditional forwarding zone matched"
                );
                request.upstream_override = Some(Arc::clone(upstreams));
            }
        }
        self.next.resolve(request).await
    }

    fn configuration(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|(zone, upstreams)| {
                let list: Vec<String> = upstreams.iter().map(Upstream::to_string).collect();
                format!("zone {zone} = {}", list.join(", "))
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "conditional_forwarder"
    }
}
