//! Per-path cache of live tree-sitter trees for incremental reparsing.
//!
//! Unlike the parse-result cache this holds at most one entry per path: the
//! tree for the last seen content. The stored hash guards against reusing a
//! tree for content it does not describe.

use std::collections::HashMap;
use std::time::Instant;

use tree_sitter::Tree;

use crate::types::Language;

pub struct CachedTree {
    pub tree: Tree,
    /// Hash of the content the tree was parsed from.
    pub hash: String,
    pub language: Language,
    last_access: Instant,
}

pub struct TreeCache {
    entries: HashMap<String, CachedTree>,
    capacity: usize,
}

impl TreeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// The tree for a path if one is cached for exactly this content hash
    /// and language. A mismatch on either returns `None`, forcing a cold
    /// parse.
    pub fn get(&mut self, path: &str, hash: &str, language: Language) -> Option<&Tree> {
        let entry = self.entries.get_mut(path)?;
        if entry.hash != hash || entry.language != language {
            return None;
        }
        entry.last_access = Instant::now();
        Some(&entry.tree)
    }

    /// Store the tree for a path, replacing any previous entry. Evicts the
    /// least recently used path when at capacity.
    pub fn set(&mut self, path: String, tree: Tree, hash: String, language: Language) {
        if !self.entries.contains_key(&path) && self.entries.len() >= self.capacity {
            self.evict_oldest(1);
        }
        self.entries.insert(
            path,
            CachedTree {
                tree,
                hash,
                language,
                last_access: Instant::now(),
            },
        );
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Evict up to `n` entries, least recently accessed first.
    pub fn evict_oldest(&mut self, n: usize) -> usize {
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.last_access))
            .collect();
        by_age.sort_by_key(|(_, at)| *at);

        let mut evicted = 0;
        for (path, _) in by_age.into_iter().take(n) {
            self.entries.remove(&path);
            evicted += 1;
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::treesitter::SyntaxEngine;

    fn python_tree(source: &str) -> Tree {
        let engine = SyntaxEngine::new(tree_sitter_python::LANGUAGE.into());
        engine.parse(source, None).unwrap()
    }

    #[test]
    fn test_hash_mismatch_misses() {
        let mut cache = TreeCache::new(4);
        cache.set(
            "a.py".into(),
            python_tree("x = 1"),
            "h1".into(),
            Language::Python,
        );

        assert!(cache.get("a.py", "h1", Language::Python).is_some());
        assert!(cache.get("a.py", "h2", Language::Python).is_none());
    }

    #[test]
    fn test_language_mismatch_misses() {
        let mut cache = TreeCache::new(4);
        cache.set(
            "a.py".into(),
            python_tree("x = 1"),
            "h1".into(),
            Language::Python,
        );
        // Same path and hash under a different family must not reuse the tree.
        assert!(cache.get("a.py", "h1", Language::TypeScript).is_none());
    }

    #[test]
    fn test_one_entry_per_path() {
        let mut cache = TreeCache::new(4);
        cache.set(
            "a.py".into(),
            python_tree("x = 1"),
            "h1".into(),
            Language::Python,
        );
        cache.set(
            "a.py".into(),
            python_tree("x = 2"),
            "h2".into(),
            Language::Python,
        );

        assert_eq!(cache.len(), 1);
        assert!(cache.get("a.py", "h1", Language::Python).is_none());
        assert!(cache.get("a.py", "h2", Language::Python).is_some());
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let mut cache = TreeCache::new(2);
        cache.set(
            "a.py".into(),
            python_tree("a = 1"),
            "h".into(),
            Language::Python,
        );
        cache.set(
            "b.py".into(),
            python_tree("b = 1"),
            "h".into(),
            Language::Python,
        );
        cache.get("a.py", "h", Language::Python);
        cache.set(
            "c.py".into(),
            python_tree("c = 1"),
            "h".into(),
            Language::Python,
        );

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a.py", "h", Language::Python).is_some());
        assert!(cache.get("b.py", "h", Language::Python).is_none());
    }

    #[test]
    fn test_evict_oldest() {
        let mut cache = TreeCache::new(8);
        for i in 0..4 {
            cache.set(
                format!("f{}.py", i),
                python_tree("x = 1"),
                "h".into(),
                Language::Python,
            );
        }
        assert_eq!(cache.evict_oldest(2), 2);
        assert_eq!(cache.len(), 2);
    }
}
