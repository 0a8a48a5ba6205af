//! Caching chain stage.
//!
//! Hits rebuild the response from the stored records with TTLs
//! decremented by the entry's age and the request's own ID and question.
//! Misses go downstream under a single-flight barrier so N concurrent
//! identical questions cost one upstream query.

use crate::dns::cache::{CacheKey, CachedResponse, DnsCache};
use crate::dns::message;
use crate::dns::single_flight::SingleFlight;
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use warden_dns_application::ports::Resolver;
use warden_dns_domain::{DnsError, DnsRequest, DnsResponse, ResponseKind};

/// Negative TTL applied when a negative answer carries no SOA.
const NO_SOA_NEGATIVE_TTL: Duration = Duration::from_secs(300);

pub struct CachingResolver {
    next: Arc<dyn Resolver>,
    cache: Arc<DnsCache>,
    /// TTL floor for positive entries; zero means no floor.
    min_caching_time: Duration,
    /// TTL cap for positive entries; zero means uncapped.
    max_caching_time: Duration,
    /// Cap for negative TTLs derived from SOA minimums.
    negative_cache_time: Duration,
    inflight: SingleFlight<CacheKey, DnsResponse>,
}

impl CachingResolver {
    pub fn new(
        next: Arc<dyn Resolver>,
        cache: Arc<DnsCache>,
        min_caching_time: Duration,
        max_caching_time: Duration,
        negative_cache_time: Duration,
    ) -> Self {
        Self {
            next,
            cache,
            min_caching_time,
            max_caching_time,
            negative_cache_time,
            inflight: SingleFlight::new(),
        }
    }

    fn positive_ttl(&self, smallest_rr_ttl: u32) -> Duration {
        let mut ttl = Duration::from_secs(u64::from(smallest_rr_ttl));
        if !self.min_caching_time.is_zero() && ttl < self.min_caching_time {
            ttl = self.min_caching_time;
        }
        if !self.max_caching_time.is_zero() && ttl > self.max_caching_time {
            ttl = self.max_caching_time;
        }
        ttl
    }

    fn negative_ttl(&self, soa_minimum: Option<u32>) -> Duration {
        match soa_minimum {
            Some(minimum) => {
                Duration::from_secs(u64::from(minimum)).min(self.negative_cache_time)
            }
            None => NO_SOA_NEGATIVE_TTL.min(self.negative_cache_time),
        }
    }

    fn store(&self, key: CacheKey, response: &DnsResponse, now: Instant) {
        let msg = &response.message;

        let ttl = if msg.response_code() == ResponseCode::NoError && !msg.answers().is_empty() {
            let smallest = message::min_answer_ttl(msg).unwrap_or(0);
            self.positive_ttl(smallest)
        } else if message::is_negative(msg) {
            self.negative_ttl(message::soa_minimum(msg))
        } else {
            // SERVFAIL and friends are never cached.
            return;
        };

        if ttl.is_zero() {
            return;
        }

        self.cache.insert(
            key,
            CachedResponse {
                answers: msg.answers().to_vec(),
                authority: msg.name_servers().to_vec(),
                response_code: msg.response_code(),
                kind: response.kind,
                stored_at: now,
                expires_at: now + ttl,
            },
        );
    }

    fn hit_response(&self, request: &DnsRequest, entry: &CachedResponse, now: Instant) -> DnsResponse {
        let elapsed_secs = now.duration_since(entry.stored_at).as_secs();

        let mut msg = message::response_template(&request.message);
        msg.set_response_code(entry.response_code);
        msg.insert_answers(message::records_with_decremented_ttl(
            &entry.answers,
            elapsed_secs,
        ));
        msg.insert_name_servers(message::records_with_decremented_ttl(
            &entry.authority,
            elapsed_secs,
        ));

        DnsResponse::new(msg, ResponseKind::Cached, self.name())
    }
}

#[async_trait]
impl Resolver for CachingResolver {
    async fn resolve(&self, request: &mut DnsRequest) -> Result<DnsResponse, DnsError> {
        let Some(question) = request.single_question() else {
            return self.next.resolve(request).await;
        };
        let key = CacheKey::from_query(question);
        let now = Instant::now();

        if let Some(entry) = self.cache.get(&key, now) {
            debug!(name = %key.name, record_type = %key.record_type, "Cache HIT");
            return Ok(self.hit_response(request, &entry, now));
        }

        debug!(name = %key.name, record_type = %key.record_type, "Cache MISS");

        let request_id = request.message.id();
        let store_key = key.clone();
        let mut response = self
            .inflight
            .run(key, async {
                let response = self.next.resolve(request).await?;
                self.store(store_key, &response, Instant::now());
                Ok(response)
            })
            .await?;

        // Coalesced waiters share the leader's message; each reply must
        // carry its own transaction ID.
        response.message.set_id(request_id);
        Ok(response)
    }

    fn configuration(&self) -> Vec<String> {
        vec![
            format!("minCachingTime    = {}s", self.min_caching_time.as_secs()),
            format!("maxCachingTime    = {}s", self.max_caching_time.as_secs()),
            format!(
                "negativeCacheTime = {}s",
                self.negative_cache_time.as_secs()
            ),
        ]
    }

    fn name(&self) -> &'static str {
        "caching"
    }
}
