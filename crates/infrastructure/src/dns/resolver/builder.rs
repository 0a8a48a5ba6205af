//! Bottom-up construction of the resolver chain.
//!
//! The terminal dispatcher is built first; every enabled stage wraps
//! the chain built so far and owns its successor. Stages disabled by
//! configuration are simply not inserted.

use super::blocking::BlockingResolver;
use super::caching::CachingResolver;
use super::client_name::ClientNameResolver;
use super::conditional::ConditionalForwarderResolver;
use super::custom_dns::CustomDnsResolver;
use super::dispatcher::UpstreamDispatcher;
use super::query_log::QueryLoggerResolver;
use super::stats::StatsRecorderResolver;
use crate::dns::block_filter::BlockingEngine;
use crate::dns::cache::DnsCache;
use crate::dns::stats::StatsRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use warden_dns_application::ports::{QueryLogSink, Resolver};
use warden_dns_domain::{ClientGroups, Config, DnsError};

pub struct BuiltChain {
    pub resolver: Arc<dyn Resolver>,
    /// One block of printable lines per stage, in chain order.
    pub description: Vec<String>,
}

pub struct ChainBuilder {
    config: Arc<Config>,
    blocking_engine: Option<Arc<BlockingEngine>>,
    cache: Option<Arc<DnsCache>>,
    query_log: Option<Arc<dyn QueryLogSink>>,
    stats: Option<Arc<StatsRegistry>>,
}

impl ChainBuilder {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            blocking_engine: None,
            cache: None,
            query_log: None,
            stats: None,
        }
    }

    pub fn with_blocking_engine(mut self, engine: Arc<BlockingEngine>) -> Self {
        self.blocking_engine = Some(engine);
        self
    }

    pub fn with_cache(mut self, cache: Arc<DnsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_query_log(mut self, sink: Arc<dyn QueryLogSink>) -> Self {
        self.query_log = Some(sink);
        self
    }

    pub fn with_stats(mut self, stats: Arc<StatsRegistry>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn build(self) -> Result<BuiltChain, DnsError> {
        let cfg = &self.config;
        let minutes = |m: u64| Duration::from_secs(m * 60);
        let query_timeout = Duration::from_secs(cfg.upstream.query_timeout);

        // Stage descriptions are collected innermost-first and reversed
        // into chain order at the end.
        let mut stages: Vec<(&'static str, Vec<String>)> = Vec::new();
        fn describe(resolver: &dyn Resolver, stages: &mut Vec<(&'static str, Vec<String>)>) {
            stages.push((resolver.name(), resolver.configuration()));
        }

        let dispatcher = UpstreamDispatcher::new(
            cfg.upstream.external_resolvers.clone(),
            cfg.upstream.resolver_count,
            query_timeout,
        );
        describe(&dispatcher, &mut stages);
        let mut resolver: Arc<dyn Resolver> = Arc::new(dispatcher);

        if let Some(cache) = self.cache {
            let caching = CachingResolver::new(
                resolver,
                cache,
                minutes(cfg.caching.min_caching_time),
                minutes(cfg.caching.max_caching_time),
                minutes(cfg.caching.negative_cache_time),
            );
            describe(&caching, &mut stages);
            resolver = Arc::new(caching);
        }

        if let Some(engine) = self.blocking_engine {
            let groups = ClientGroups::from_config(&cfg.blocking.client_groups_block)
                .map_err(DnsError::ConfigInvalid)?;
            let blocking = BlockingResolver::new(
                resolver,
                engine,
                Arc::new(groups),
                cfg.blocking.block_type,
                cfg.blocking.block_ttl,
                cfg.blocking.custom_ips.clone(),
            );
            describe(&blocking, &mut stages);
            resolver = Arc::new(blocking);
        }

        let custom_mapping = cfg
            .custom_dns
            .parsed_mapping()
            .map_err(DnsError::ConfigInvalid)?;
        if !custom_mapping.is_empty() {
            let custom =
                CustomDnsResolver::new(resolver, custom_mapping, cfg.custom_dns.custom_ttl);
            describe(&custom, &mut stages);
            resolver = Arc::new(custom);
        }

        let conditional_rules = cfg
            .conditional
            .parsed_mapping()
            .map_err(DnsError::ConfigInvalid)?;
        if !conditional_rules.is_empty() {
            let conditional = ConditionalForwarderResolver::new(resolver, conditional_rules);
            describe(&conditional, &mut stages);
            resolver = Arc::new(conditional);
        }

        if let Some(stats) = self.stats {
            let recorder = StatsRecorderResolver::new(resolver, stats);
            describe(&recorder, &mut stages);
            resolver = Arc::new(recorder);
        }

        if let Some(sink) = self.query_log {
            let logger = QueryLoggerResolver::new(resolver, sink);
            describe(&logger, &mut stages);
            resolver = Arc::new(logger);
        }

        if cfg.client_lookup.enabled() {
            let client_name = ClientNameResolver::new(
                resolver,
                cfg.client_lookup.upstream.clone(),
                cfg.client_lookup.single_name_order.clone(),
                minutes(cfg.client_lookup.cache_time),
                minutes(cfg.client_lookup.negative_cache_time),
                query_timeout,
            );
            describe(&client_name, &mut stages);
            resolver = Arc::new(client_name);
        }

        stages.reverse();
        let mut description = Vec::new();
        for (name, lines) in stages {
            description.push(format!("{name}:"));
            for line in lines {
                description.push(format!("  {line}"));
            }
        }

        info!(stages = description.len(), "Resolver chain built");

        Ok(BuiltChain {
            resolver,
            description,
        })
    }
}
