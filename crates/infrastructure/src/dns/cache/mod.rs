//! TTL-respecting response cache with a sharded approximate-LRU bound.
//!
//! Entries store the answer and authority records plus the response
//! code, stamped with insertion and expiry instants. Reads promote
//! entries within their shard's LRU order; expired entries are dropped
//! on read and by the periodic sweep.

pub mod key;

pub use key::CacheKey;

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::Record;
use lru::LruCache;
use rustc_hash::{FxBuildHasher, FxHasher};
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Instant;
use tracing::debug;
use warden_dns_domain::ResponseKind;

const SHARD_COUNT: usize = 16;

/// One cached response, minus the producing stage.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub response_code: ResponseCode,
    pub kind: ResponseKind,
    pub stored_at: Instant,
    pub expires_at: Instant,
}

impl CachedResponse {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

type Shard = Mutex<LruCache<CacheKey, CachedResponse, FxBuildHasher>>;

pub struct DnsCache {
    shards: Vec<Shard>,
}

impl DnsCache {
    /// `max_entries` bounds the total entry count; 0 means unbounded.
    pub fn new(max_entries: usize) -> Self {
        let per_shard = if max_entries == 0 {
            None
        } else {
            Some(NonZeroUsize::new((max_entries / SHARD_COUNT).max(1)).expect("nonzero"))
        };

        let shards = (0..SHARD_COUNT)
            .map(|_| {
                Mutex::new(match per_shard {
                    Some(cap) => LruCache::with_hasher(cap, FxBuildHasher),
                    None => LruCache::unbounded_with_hasher(FxBuildHasher),
                })
            })
            .collect();

        Self { shards }
    }

    fn shard(&self, key: &CacheKey) -> &Shard {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Returns the entry for `key` if present and not expired; expired
    /// entries are evicted on the way out.
    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<CachedResponse> {
        let mut shard = self.shard(key).lock().expect("cache shard poisoned");
        match shard.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.clone()),
            Some(_) => {
                shard.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, entry: CachedResponse) {
        let mut shard = self.shard(&key).lock().expect("cache shard poisoned");
        shard.put(key, entry);
    }

    /// Drops every expired entry; returns how many were removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut shard = shard.lock().expect("cache shard poisoned");
            let expired: Vec<CacheKey> = shard
                .iter()
                .filter(|(_, entry)| entry.is_expired(now))
                .map(|(key, _)| key.clone())
                .collect();
            for key in expired {
                shard.pop(&key);
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "Cache sweep evicted expired entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().expect("cache shard poisoned").len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().expect("cache shard poisoned").clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::{DNSClass, RecordType};
    use std::time::Duration;

    fn key(name: &str) -> CacheKey {
        CacheKey::new(name, RecordType::A, DNSClass::IN)
    }

    fn entry(ttl: Duration) -> CachedResponse {
        let now = Instant::now();
        CachedResponse {
            answers: vec![],
            authority: vec![],
            response_code: ResponseCode::NoError,
            kind: ResponseKind::Resolved,
            stored_at: now,
            expires_at: now + ttl,
        }
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let cache = DnsCache::new(100);
        cache.insert(key("a.example"), entry(Duration::from_secs(0)));

        assert!(cache
            .get(&key("a.example"), Instant::now() + Duration::from_millis(1))
            .is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn live_entries_are_returned() {
        let cache = DnsCache::new(100);
        cache.insert(key("a.example"), entry(Duration::from_secs(60)));
        assert!(cache.get(&key("a.example"), Instant::now()).is_some());
    }

    #[test]
    fn sweep_removes_only_expired() {
        let cache = DnsCache::new(100);
        cache.insert(key("dead.example"), entry(Duration::from_secs(0)));
        cache.insert(key("live.example"), entry(Duration::from_secs(300)));

        let removed = cache.sweep_expired(Instant::now() + Duration::from_millis(1));
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entry_count_is_bounded() {
        let cache = DnsCache::new(SHARD_COUNT);
        for i in 0..SHARD_COUNT * 10 {
            cache.insert(key(&format!("host{i}.example")), entry(Duration::from_secs(60)));
        }
        assert!(cache.len() <= SHARD_COUNT * 10);
        // Each shard holds at most one entry at this bound.
        assert!(cache.len() <= SHARD_COUNT);
    }
}
