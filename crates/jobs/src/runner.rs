use crate::{CacheMaintenanceJob, ListRefreshJob};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Spawns the configured background jobs, all wired to one shutdown
/// token.
pub struct JobRunner {
    list_refresh: Option<ListRefreshJob>,
    cache_maintenance: Option<CacheMaintenanceJob>,
    shutdown: Option<CancellationToken>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            list_refresh: None,
            cache_maintenance: None,
            shutdown: None,
        }
    }

    pub fn with_list_refresh(mut self, job: ListRefreshJob) -> Self {
        self.list_refresh = Some(job);
        self
    }

    pub fn with_cache_maintenance(mut self, job: CacheMaintenanceJob) -> Self {
        self.cache_maintenance = Some(job);
        self
    }

    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn start(self) {
        info!("Starting background jobs");

        if let Some(job) = self.list_refresh {
            let job = match &self.shutdown {
                Some(token) => job.with_cancellation(token.clone()),
                None => job,
            };
            tokio::spawn(Arc::new(job).start());
        }

        if let Some(job) = self.cache_maintenance {
            let job = match &self.shutdown {
                Some(token) => job.with_cancellation(token.clone()),
                None => job,
            };
            tokio::spawn(Arc::new(job).start());
        }
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
