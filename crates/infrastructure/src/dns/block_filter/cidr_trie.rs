use ipnetwork::IpNetwork;
use std::net::IpAddr;

#[derive(Default)]
struct CidrNode {
    children: [Option<Box<CidrNode>>; 2],
    /// A network prefix ends at this node; its length is the depth.
    terminal: bool,
}

/// CIDR matcher: a binary trie keyed on address bits, with separate
/// roots per address family.
///
/// Lookup walks one node per prefix bit and reports the most specific
/// covering prefix, so membership is O(address bits) regardless of how
/// many networks are loaded.
#[derive(Default)]
pub struct CidrTrie {
    v4: CidrNode,
    v6: CidrNode,
    len: usize,
}

#[inline]
fn bit_at(octets: &[u8], index: usize) -> usize {
    ((octets[index / 8] >> (7 - index % 8)) & 1) as usize
}

impl CidrTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, network: &IpNetwork) {
        let (root, octets, prefix) = match network {
            IpNetwork::V4(net) => (
                &mut self.v4,
                net.network().octets().to_vec(),
                net.prefix() as usize,
            ),
            IpNetwork::V6(net) => (
                &mut self.v6,
                net.network().octets().to_vec(),
                net.prefix() as usize,
            ),
        };

        let mut node = root;
        for i in 0..prefix {
            node = node.children[bit_at(&octets, i)]
                .get_or_insert_with(Box::default)
                .as_mut();
        }
        if !node.terminal {
            node.terminal = true;
            self.len += 1;
        }
    }

    /// Length of the most specific stored prefix covering `ip`.
    pub fn longest_match(&self, ip: IpAddr) -> Option<u8> {
        let (root, octets) = match ip {
            IpAddr::V4(v4) => (&self.v4, v4.octets().to_vec()),
            IpAddr::V6(v6) => (&self.v6, v6.octets().to_vec()),
        };

        let mut node = root;
        let mut best: Option<u8> = None;

        for i in 0..octets.len() * 8 {
            if node.terminal {
                best = Some(i as u8);
            }
            match &node.children[bit_at(&octets, i)] {
                Some(child) => node = child.as_ref(),
                None => return best,
            }
        }
        if node.terminal {
            best = Some((octets.len() * 8) as u8);
        }
        best
    }

    #[inline]
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.longest_match(ip).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(cidrs: &[&str]) -> CidrTrie {
        let mut trie = CidrTrie::new();
        for cidr in cidrs {
            trie.insert(&cidr.parse().unwrap());
        }
        trie
    }

    #[test]
    fn membership_respects_prefix_boundaries() {
        let t = trie(&["192.0.2.0/24"]);

        assert!(t.contains("192.0.2.1".parse().unwrap()));
        assert!(t.contains("192.0.2.255".parse().unwrap()));
        assert!(!t.contains("192.0.3.0".parse().unwrap()));
        assert!(!t.contains("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn longest_match_picks_the_most_specific_prefix() {
        let t = trie(&["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24"]);

        assert_eq!(t.longest_match("10.1.1.50".parse().unwrap()), Some(24));
        assert_eq!(t.longest_match("10.1.2.50".parse().unwrap()), Some(16));
        assert_eq!(t.longest_match("10.9.9.9".parse().unwrap()), Some(8));
        assert_eq!(t.longest_match("11.0.0.1".parse().unwrap()), None);
    }

    #[test]
    fn host_routes_match_exactly() {
        let t = trie(&["198.51.100.7/32"]);

        assert_eq!(t.longest_match("198.51.100.7".parse().unwrap()), Some(32));
        assert!(!t.contains("198.51.100.8".parse().unwrap()));
    }

    #[test]
    fn families_are_kept_apart() {
        let t = trie(&["2001:db8::/32", "192.0.2.0/24"]);

        assert!(t.contains("2001:db8::1".parse().unwrap()));
        assert!(!t.contains("2001:db9::1".parse().unwrap()));
        assert!(t.contains("192.0.2.9".parse().unwrap()));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn duplicate_prefixes_count_once() {
        let t = trie(&["10.0.0.0/8", "10.0.0.0/8"]);
        assert_eq!(t.len(), 1);
    }
}
