use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warden_dns_infrastructure::dns::block_filter::BlockingEngine;

/// Background job that periodically re-fetches and recompiles the
/// blocking lists.
///
/// The first tick is consumed immediately so no refresh runs at
/// startup (the engine compiles during construction). A failed refresh
/// keeps the engine's previous snapshot.
pub struct ListRefreshJob {
    engine: Arc<BlockingEngine>,
    interval: Duration,
    cancel: CancellationToken,
}

impl ListRefreshJob {
    pub fn new(engine: Arc<BlockingEngine>, interval: Duration) -> Self {
        Self {
            engine,
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
            "Starting list refresh job"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("List refresh job stopped");
                    return;
                }
                _ = interval.tick() => {
                    info!("Refreshing blocking lists");
                    let sources = self.engine.refresh().await;
                    info!(sources, entries = self.engine.entry_count(), "List refresh completed");
                }
            }
        }
    }
}
