use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warden_dns_domain::Config;
use warden_dns_infrastructure::dns::block_filter::BlockingEngine;
use warden_dns_infrastructure::dns::resolver::ChainBuilder;
use warden_dns_infrastructure::dns::{DnsCache, StatsRegistry, TracingQueryLog};
use warden_dns_jobs::{CacheMaintenanceJob, JobRunner, ListRefreshJob};

mod bootstrap;
mod server;

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Parser)]
#[command(name = "warden-dns")]
#[command(version)]
#[command(about = "Caching, filtering DNS front-end")]
struct Cli {
    /// Configuration file path
    #[arg(long, value_name = "FILE", default_value = "./config.yml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config =
        Config::load(&cli.config).map_err(|e| anyhow::anyhow!("cannot start: {e}"))?;

    bootstrap::init_logging(&config.log_level);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config,
        "Starting Warden DNS"
    );

    let config = Arc::new(config);

    let cache = Arc::new(DnsCache::new(config.caching.max_items_count));
    let stats = Arc::new(StatsRegistry::new());
    let (query_log, _query_log_task) = TracingQueryLog::spawn();
    let query_log = Arc::new(query_log);

    let blocking_engine = if config.blocking.enabled() {
        let engine = BlockingEngine::new(
            config.blocking.black_lists.clone(),
            config.blocking.white_lists.clone(),
        )
        .await
        .map_err(|e| anyhow::anyhow!("cannot start: {e}"))?;
        Some(Arc::new(engine))
    } else {
        None
    };

    let mut builder = ChainBuilder::new(Arc::clone(&config))
        .with_cache(Arc::clone(&cache))
        .with_stats(Arc::clone(&stats))
        .with_query_log(query_log);
    if let Some(engine) = &blocking_engine {
        builder = builder.with_blocking_engine(Arc::clone(engine));
    }
    let chain = builder
        .build()
        .map_err(|e| anyhow::anyhow!("cannot start: {e}"))?;

    info!("Resolver chain configuration:");
    for line in &chain.description {
        info!("  {line}");
    }

    let shutdown = CancellationToken::new();

    let mut jobs = JobRunner::new()
        .with_cache_maintenance(CacheMaintenanceJob::new(
            Arc::clone(&cache),
            CACHE_SWEEP_INTERVAL,
        ))
        .with_shutdown_token(shutdown.clone());
    if let Some(engine) = &blocking_engine {
        if config.blocking.refresh_period > 0 {
            jobs = jobs.with_list_refresh(ListRefreshJob::new(
                Arc::clone(engine),
                Duration::from_secs(config.blocking.refresh_period * 60),
            ));
        }
    }
    jobs.start();

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            server_shutdown.cancel();
        }
    });

    server::serve(config.port, chain.resolver, shutdown).await?;

    info!("Shutdown complete");
    Ok(())
}
