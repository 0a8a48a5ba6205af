//! Deduplication of concurrent identical operations.
//!
//! The first caller for a key becomes the leader and runs the work;
//! every concurrent caller for the same key subscribes to the leader's
//! result instead of repeating it. Used by the caching stage, the
//! client-name cache and the in-flight upstream coalescing.

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::watch;
use warden_dns_domain::DnsError;

type Slot<V> = Arc<watch::Sender<Option<Result<V, DnsError>>>>;

pub struct SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    inflight: DashMap<K, Slot<V>, FxBuildHasher>,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            inflight: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Number of keys currently in flight.
    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }

    /// Runs `work` for `key`, coalescing with any in-flight call for the
    /// same key. Followers receive a clone of the leader's result,
    /// including its error.
    pub async fn run<Fut>(&self, key: K, work: Fut) -> Result<V, DnsError>
    where
        Fut: Future<Output = Result<V, DnsError>>,
    {
        let (is_leader, mut rx) = match self.inflight.entry(key.clone()) {
            dashmap::Entry::Occupied(entry) => {
                let rx = entry.get().subscribe();
                drop(entry);
                (false, rx)
            }
            dashmap::Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None::<Result<V, DnsError>>);
                entry.insert(Arc::new(tx));
                (true, rx)
            }
        };

        if !is_leader {
            if rx.changed().await.is_ok() {
                if let Some(result) = rx.borrow().clone() {
                    return result;
                }
            }
            // The leader may have published before we subscribed.
            if let Some(result) = rx.borrow().clone() {
                return result;
            }
            // Leader vanished without publishing (cancelled mid-flight);
            // fall back to doing the work ourselves.
            return work.await;
        }

        // Remove the slot even if the leader's future is dropped, so
        // followers fall back instead of waiting forever.
        let mut cleanup = LeaderCleanup {
            inflight: &self.inflight,
            key: Some(key),
        };

        let result = work.await;

        if let Some(key) = cleanup.key.take() {
            if let Some((_, tx)) = self.inflight.remove(&key) {
                let _ = tx.send(Some(result.clone()));
            }
        }

        result
    }
}

struct LeaderCleanup<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    inflight: &'a DashMap<K, Slot<V>, FxBuildHasher>,
    key: Option<K>,
}

impl<K, V> Drop for LeaderCleanup<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            // Dropping the sender closes the channel; waiters observe
            // the close and run the work themselves.
            self.inflight.remove(&key);
        }
    }
}
