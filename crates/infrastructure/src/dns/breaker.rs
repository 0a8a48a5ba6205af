//! Per-upstream circuit breaker.
//!
//! Counts consecutive failures per upstream; once the threshold is
//! reached the upstream is parked for a cooldown and skipped by the
//! dispatcher until the cooldown elapses. Purely passive: state only
//! changes when the dispatcher reports attempt outcomes.

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use warden_dns_domain::Upstream;

const DEFAULT_FAILURE_THRESHOLD: u32 = 10;
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Clone)]
struct BreakerState {
    consecutive_failures: u32,
    parked_until: Option<Instant>,
}

pub struct CircuitBreaker {
    state: DashMap<String, BreakerState, FxBuildHasher>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_COOLDOWN)
    }
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: DashMap::with_hasher(FxBuildHasher),
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    /// True unless the upstream is currently parked.
    pub fn is_available(&self, upstream: &Upstream) -> bool {
        match self.state.get(&upstream.to_string()) {
            Some(entry) => match entry.parked_until {
                Some(until) => Instant::now() >= until,
                None => true,
            },
            None => true,
        }
    }

    pub fn record_success(&self, upstream: &Upstream) {
        if let Some(mut entry) = self.state.get_mut(&upstream.to_string()) {
            if entry.consecutive_failures > 0 {
                debug!(server = %upstream, "Upstream recovered");
            }
            entry.consecutive_failures = 0;
            entry.parked_until = None;
        }
    }

    pub fn record_failure(&self, upstream: &Upstream) {
        let mut entry = self.state.entry(upstream.to_string()).or_default();
        entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
        if entry.consecutive_failures >= self.failure_threshold && entry.parked_until.is_none() {
            entry.parked_until = Some(Instant::now() + self.cooldown);
            warn!(
                server = %upstream,
                failures = entry.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs(),
                "Upstream parked after consecutive failures"
            );
        }
    }

    pub fn consecutive_failures(&self, upstream: &Upstream) -> u32 {
        self.state
            .get(&upstream.to_string())
            .map(|e| e.consecutive_failures)
            .unwrap_or(0)
    }
}
