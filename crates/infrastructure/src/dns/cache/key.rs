use compact_str::CompactString;
use hickory_proto::op::Query;
use hickory_proto::rr::{DNSClass, RecordType};
use std::hash::{Hash, Hasher};

/// Cache key: question name lowercased with the trailing dot removed,
/// plus the query type and class.
#[derive(Clone, Debug, Eq)]
pub struct CacheKey {
    pub name: CompactString,
    pub record_type: RecordType,
    pub dns_class: DNSClass,
}

impl CacheKey {
    pub fn new(name: &str, record_type: RecordType, dns_class: DNSClass) -> Self {
        let normalized = name.to_ascii_lowercase();
        let normalized = normalized.trim_end_matches('.');
        Self {
            name: CompactString::from(normalized),
            record_type,
            dns_class,
        }
    }

    pub fn from_query(query: &Query) -> Self {
        Self::new(
            &query.name().to_utf8(),
            query.query_type(),
            query.query_class(),
        )
    }
}

impl Hash for CacheKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.as_str().hash(state);
        u16::from(self.record_type).hash(state);
        u16::from(self.dns_class).hash(state);
    }
}

impl PartialEq for CacheKey {
    #[inline]
    fn eq(&self, other: &CacheKey) -> bool {
        self.record_type == other.record_type
            && self.dns_class == other.dns_class
            && self.name == other.name
    }
}
