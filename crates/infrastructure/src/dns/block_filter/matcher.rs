use super::cidr_trie::CidrTrie;
use super::parser::ListEntry;
use super::suffix_trie::SuffixTrie;
use compact_str::CompactString;
use fancy_regex::Regex;
use rustc_hash::FxBuildHasher;
use std::collections::HashSet;
use std::net::IpAddr;
use tracing::warn;

/// Compiled form of one group's deny or allow lists: an exact-domain
/// set, a reversed-label suffix trie, compiled regexes, and a CIDR
/// trie matched against client IPs.
#[derive(Default)]
pub struct ListMatcher {
    exact: HashSet<CompactString, FxBuildHasher>,
    suffixes: SuffixTrie,
    regexes: Vec<Regex>,
    networks: CidrTrie,
}

impl ListMatcher {
    /// Compiles entries into a matcher. Invalid regexes are skipped
    /// per entry, matching the per-entry recoverability of list parsing.
    pub fn from_entries(entries: impl IntoIterator<Item = ListEntry>) -> Self {
        let mut matcher = ListMatcher::default();
        for entry in entries {
            match entry {
                ListEntry::Exact(domain) => {
                    matcher.exact.insert(CompactString::from(domain));
                }
                ListEntry::Wildcard(pattern) => {
                    matcher.suffixes.insert(&pattern);
                }
                ListEntry::Regex(pattern) => match Regex::new(&pattern) {
                    Ok(regex) => matcher.regexes.push(regex),
                    Err(e) => {
                        warn!(pattern = %pattern, error = %e, "Skipping invalid regex list entry");
                    }
                },
                ListEntry::Net(network) => matcher.networks.insert(&network),
            }
        }
        matcher
    }

    /// `name` must already be lowercased without a trailing dot.
    pub fn matches_name(&self, name: &str) -> bool {
        if self.exact.contains(name) {
            return true;
        }
        if self.suffixes.matches(name) {
            return true;
        }
        self.regexes
            .iter()
            .any(|regex| regex.is_match(name).unwrap_or(false))
    }

    pub fn matches_ip(&self, ip: IpAddr) -> bool {
        self.networks.contains(ip)
    }

    pub fn entry_count(&self) -> usize {
        self.exact.len() + self.suffixes.len() + self.regexes.len() + self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}
