use super::matcher::ListMatcher;
use super::parser::{parse_list_text, ListEntry};
use super::sources::ListFetcher;
use arc_swap::ArcSwap;
use dashmap::DashMap;
use futures::future::join_all;
use rustc_hash::FxBuildHasher;
use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use warden_dns_domain::DnsError;

/// Outcome of consulting the lists for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDecision {
    /// An allow list matched; the request must be forwarded even if a
    /// deny list also matches.
    Allow,
    /// A deny list matched and no allow list did.
    Deny,
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Ready,
    Loading,
}

const STATUS_READY: u8 = 0;
const STATUS_LOADING: u8 = 1;

/// One immutable compiled generation of all groups' matchers. Readers
/// always see a whole snapshot, never a mix of generations.
#[derive(Default)]
pub struct BlockSnapshot {
    deny: HashMap<String, ListMatcher>,
    allow: HashMap<String, ListMatcher>,
}

impl BlockSnapshot {
    pub fn total_entries(&self) -> usize {
        self.deny
            .values()
            .chain(self.allow.values())
            .map(ListMatcher::entry_count)
            .sum()
    }
}

/// Compiles deny/allow list sources into per-group matchers and decides
/// requests against the active snapshot.
///
/// Refreshes never touch the live snapshot: a new one is compiled aside
/// and published with a single atomic swap. A source that fails to
/// download keeps its last good parse.
pub struct BlockingEngine {
    snapshot: ArcSwap<BlockSnapshot>,
    last_good: DashMap<String, Arc<Vec<ListEntry>>, FxBuildHasher>,
    status: AtomicU8,
    deny_sources: HashMap<String, Vec<String>>,
    allow_sources: HashMap<String, Vec<String>>,
    fetcher: ListFetcher,
}

impl BlockingEngine {
    /// Builds the engine and performs the initial load. Fails when list
    /// sources are configured but not a single one could be fetched.
    pub async fn new(
        deny_sources: HashMap<String, Vec<String>>,
        allow_sources: HashMap<String, Vec<String>>,
    ) -> Result<Self, DnsError> {
        let engine = Self {
            snapshot: ArcSwap::from_pointee(BlockSnapshot::default()),
            last_good: DashMap::with_hasher(FxBuildHasher),
            status: AtomicU8::new(STATUS_READY),
            deny_sources,
            allow_sources,
            fetcher: ListFetcher::new(),
        };

        let available = engine.refresh().await;
        if !engine.all_sources().is_empty() && available == 0 {
            return Err(DnsError::ConfigInvalid(
                "no blocking list source could be loaded at startup".to_string(),
            ));
        }

        let snapshot = engine.snapshot.load();
        info!(
            groups = engine.deny_sources.len(),
            entries = snapshot.total_entries(),
            "Blocking engine compiled"
        );

        Ok(engine)
    }

    fn all_sources(&self) -> BTreeSet<String> {
        self.deny_sources
            .values()
            .chain(self.allow_sources.values())
            .flatten()
            .cloned()
            .collect()
    }

    /// Fetches every source, compiles a fresh snapshot and publishes it.
    /// Returns the number of sources that contributed entries (fetched
    /// now or retained from the last good parse). Fetch failures are
    /// logged and never wipe a previous version.
    pub async fn refresh(&self) -> usize {
        self.status.store(STATUS_LOADING, Ordering::Release);

        let sources = self.all_sources();
        let fetches = sources
            .iter()
            .map(|source| async move { (source.clone(), self.fetcher.fetch(source).await) });
        let results = join_all(fetches).await;

        let mut available = 0usize;
        for (source, result) in results {
            match result {
                Ok(text) => {
                    let entries = Arc::new(parse_list_text(&text));
                    info!(source = %source, entries = entries.len(), "List source fetched");
                    self.last_good.insert(source, entries);
                    available += 1;
                }
                Err(e) => {
                    if self.last_good.contains_key(&source) {
                        warn!(source = %source, error = %e, "List fetch failed; keeping previous version");
                        available += 1;
                    } else {
                        warn!(source = %source, error = %e, "List fetch failed; source unavailable");
                    }
                }
            }
        }

        let snapshot = BlockSnapshot {
            deny: self.compile_groups(&self.deny_sources),
            allow: self.compile_groups(&self.allow_sources),
        };

        self.snapshot.store(Arc::new(snapshot));
        self.status.store(STATUS_READY, Ordering::Release);

        available
    }

    fn compile_groups(
        &self,
        group_sources: &HashMap<String, Vec<String>>,
    ) -> HashMap<String, ListMatcher> {
        group_sources
            .iter()
            .map(|(group, sources)| {
                let entries = sources
                    .iter()
                    .filter_map(|source| self.last_good.get(source))
                    .flat_map(|entries| entries.value().as_ref().clone())
                    .collect::<Vec<_>>();
                (group.clone(), ListMatcher::from_entries(entries))
            })
            .collect()
    }

    /// Consults the active snapshot for the given client groups.
    /// `name` must be lowercased without a trailing dot. Allow lists
    /// win over deny lists across all of the client's groups.
    pub fn decision(&self, groups: &[String], name: &str, client_ip: IpAddr) -> BlockDecision {
        let snapshot = self.snapshot.load();

        for group in groups {
            if let Some(matcher) = snapshot.allow.get(group) {
                if matcher.matches_name(name) {
                    return BlockDecision::Allow;
                }
            }
        }

        for group in groups {
            if let Some(matcher) = snapshot.deny.get(group) {
                if matcher.matches_name(name) || matcher.matches_ip(client_ip) {
                    return BlockDecision::Deny;
                }
            }
        }

        BlockDecision::NoMatch
    }

    pub fn status(&self) -> EngineStatus {
        match self.status.load(Ordering::Acquire) {
            STATUS_LOADING => EngineStatus::Loading,
            _ => EngineStatus::Ready,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.snapshot.load().total_entries()
    }

    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.deny_sources.keys().cloned().collect();
        names.sort();
        names
    }
}
