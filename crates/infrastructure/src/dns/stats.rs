//! Counter registry fed by the stats stage and drained by the external
//! metrics layer.

use compact_str::CompactString;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct StatsRegistry {
    total_queries: AtomicU64,
    resolved: AtomicU64,
    cached: AtomicU64,
    blocked: AtomicU64,
    conditional: AtomicU64,
    custom_dns: AtomicU64,
    failed: AtomicU64,
    by_record_type: DashMap<CompactString, u64, FxBuildHasher>,
    by_response_code: DashMap<CompactString, u64, FxBuildHasher>,
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub total_queries: u64,
    pub resolved: u64,
    pub cached: u64,
    pub blocked: u64,
    pub conditional: u64,
    pub custom_dns: u64,
    pub failed: u64,
    pub by_record_type: Vec<(String, u64)>,
    pub by_response_code: Vec<(String, u64)>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record_type: &str, response_kind: &str, response_code: &str) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);

        let kind_counter = match response_kind {
            "RESOLVED" => &self.resolved,
            "CACHED" => &self.cached,
            "BLOCKED" => &self.blocked,
            "CONDITIONAL" => &self.conditional,
            "CUSTOM_DNS" => &self.custom_dns,
            _ => &self.failed,
        };
        kind_counter.fetch_add(1, Ordering::Relaxed);

        *self
            .by_record_type
            .entry(CompactString::from(record_type))
            .or_insert(0) += 1;
        *self
            .by_response_code
            .entry(CompactString::from(response_code))
            .or_insert(0) += 1;
    }

    pub fn record_failure(&self, record_type: &str) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
        *self
            .by_record_type
            .entry(CompactString::from(record_type))
            .or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let mut by_record_type: Vec<(String, u64)> = self
            .by_record_type
            .iter()
            .map(|e| (e.key().to_string(), *e.value()))
            .collect();
        by_record_type.sort();

        let mut by_response_code: Vec<(String, u64)> = self
            .by_response_code
            .iter()
            .map(|e| (e.key().to_string(), *e.value()))
            .collect();
        by_response_code.sort();

        StatsSnapshot {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            conditional: self.conditional.load(Ordering::Relaxed),
            custom_dns: self.custom_dns.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            by_record_type,
            by_response_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = StatsRegistry::new();
        stats.record("A", "RESOLVED", "NOERROR");
        stats.record("A", "CACHED", "NOERROR");
        stats.record("AAAA", "BLOCKED", "NOERROR");
        stats.record_failure("A");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_queries, 4);
        assert_eq!(snapshot.resolved, 1);
        assert_eq!(snapshot.cached, 1);
        assert_eq!(snapshot.blocked, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(
            snapshot.by_record_type,
            vec![("A".to_string(), 3), ("AAAA".to_string(), 1)]
        );
    }
}
