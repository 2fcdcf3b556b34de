//! Content-addressed caches for parse results and parse trees.
//!
//! Both caches key on content hashes so stale entries are never served: an
//! edited file hashes differently and misses. The parse-result cache is a
//! plain LRU; the tree cache keeps one live tree per tracked path for
//! incremental reparsing.

mod parse_cache;
mod tree_cache;

pub use parse_cache::{CacheStats, ParseCache, ParseKey};
pub use tree_cache::{CachedTree, TreeCache};

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of file content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
        // 32 bytes hex encoded
        assert_eq!(content_hash("").len(), 64);
    }
}
