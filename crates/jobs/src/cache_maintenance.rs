use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use warden_dns_infrastructure::dns::DnsCache;

/// Background job sweeping expired entries out of the response cache.
/// The LRU bound itself is enforced on insert; this keeps dead entries
/// from occupying it.
pub struct CacheMaintenanceJob {
    cache: Arc<DnsCache>,
    interval: Duration,
    cancel: CancellationToken,
}

impl CacheMaintenanceJob {
    pub fn new(cache: Arc<DnsCache>, interval: Duration) -> Self {
        Self {
            cache,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting cache maintenance job"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Cache maintenance job stopped");
                    return;
                }
                _ = interval.tick() => {
                    let removed = self.cache.sweep_expired(Instant::now());
                    debug!(removed, remaining = self.cache.len(), "Cache sweep finished");
                }
            }
        }
    }
}
