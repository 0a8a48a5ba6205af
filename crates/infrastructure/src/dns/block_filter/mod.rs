pub mod cidr_trie;
pub mod engine;
pub mod matcher;
pub mod parser;
pub mod sources;
pub mod suffix_trie;

pub use cidr_trie::CidrTrie;
pub use engine::{BlockDecision, BlockingEngine, EngineStatus};
pub use matcher::ListMatcher;
pub use parser::{parse_list_line, parse_list_text, ListEntry};
pub use sources::ListFetcher;
pub use suffix_trie::SuffixTrie;
