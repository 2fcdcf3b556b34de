//! Language routing and the adapter interface.
//!
//! The set of supported languages is fixed at build time: five adapter
//! implementations are constructed in a deterministic registration order and
//! looked up by file extension. The first registered adapter claiming an
//! extension wins.

use std::path::Path;
use std::sync::Arc;

use tree_sitter::Tree;

use crate::types::{FrameworkRule, Language, ParseResult};

pub mod go;
pub mod java;
pub mod python;
pub mod rust_lang;
pub mod treesitter;
pub mod typescript;

/// Translates raw source text into a uniform [`ParseResult`].
///
/// Implementations never fail on malformed input: unparseable content yields
/// an empty-but-valid result carrying diagnostics.
pub trait Adapter: Send + Sync {
    /// The language family this adapter handles.
    fn language(&self) -> Language;

    /// File extensions (without dot) claimed by this adapter.
    fn extensions(&self) -> &'static [&'static str];

    /// Static framework detection signatures for this language.
    fn framework_rules(&self) -> &'static [FrameworkRule];

    /// Parse source text, optionally reusing a previous tree for an
    /// incremental update. The returned tree (when parsing succeeded) is
    /// what callers should cache for the next incremental round.
    ///
    /// With `previous = None` this is a cold full parse. With a previous
    /// tree that has had the edit applied, output is equivalent to a full
    /// reparse of `content`.
    fn parse_incremental(
        &self,
        content: &str,
        path: &str,
        previous: Option<&Tree>,
    ) -> (ParseResult, Option<Tree>);

    /// Full parse of a file.
    fn parse_file(&self, content: &str, path: &str) -> ParseResult {
        self.parse_incremental(content, path, None).0
    }

    /// Release parser-engine handles. Idempotent; a later parse call will
    /// lazily re-acquire them.
    fn dispose(&self);
}

/// Selects the adapter for a file path. Pure function of path plus the
/// registered adapter set.
pub struct Router {
    adapters: Vec<Arc<dyn Adapter>>,
}

impl Router {
    /// Build a router over an explicit adapter list. Registration order is
    /// part of the contract: the first adapter claiming an extension wins.
    pub fn new(adapters: Vec<Arc<dyn Adapter>>) -> Self {
        Self { adapters }
    }

    /// The fixed production adapter set.
    pub fn with_default_adapters() -> Self {
        Self::new(vec![
            Arc::new(typescript::TypeScriptAdapter::new()),
            Arc::new(python::PythonAdapter::new()),
            Arc::new(go::GoAdapter::new()),
            Arc::new(rust_lang::RustAdapter::new()),
            Arc::new(java::JavaAdapter::new()),
        ])
    }

    /// Pick the adapter for a file path, or `None` when unsupported.
    pub fn route(&self, path: &str) -> Option<&Arc<dyn Adapter>> {
        let ext = Path::new(path).extension().and_then(|e| e.to_str())?;
        self.adapters
            .iter()
            .find(|a| a.extensions().contains(&ext))
    }

    /// Look up the adapter for a language family.
    pub fn adapter_for(&self, language: Language) -> Option<&Arc<dyn Adapter>> {
        self.adapters.iter().find(|a| a.language() == language)
    }

    /// All claimed extensions, in registration order.
    pub fn extensions(&self) -> Vec<&'static str> {
        self.adapters
            .iter()
            .flat_map(|a| a.extensions().iter().copied())
            .collect()
    }

    /// Framework rules of all adapters, in registration order.
    pub fn framework_rules(&self) -> Vec<FrameworkRule> {
        self.adapters
            .iter()
            .flat_map(|a| a.framework_rules().iter().copied())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Dispose every adapter's engine handles.
    pub fn dispose_all(&self) {
        for adapter in &self.adapters {
            adapter.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_by_extension() {
        let router = Router::with_default_adapters();
        assert_eq!(
            router.route("src/app.ts").map(|a| a.language()),
            Some(Language::TypeScript)
        );
        assert_eq!(
            router.route("pkg/main.go").map(|a| a.language()),
            Some(Language::Go)
        );
        assert_eq!(
            router.route("lib/mod.rs").map(|a| a.language()),
            Some(Language::Rust)
        );
        assert_eq!(
            router.route("app/views.py").map(|a| a.language()),
            Some(Language::Python)
        );
        assert_eq!(
            router.route("src/Main.java").map(|a| a.language()),
            Some(Language::Java)
        );
    }

    #[test]
    fn test_route_unsupported() {
        let router = Router::with_default_adapters();
        assert!(router.route("README.md").is_none());
        assert!(router.route("noextension").is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        // Two adapters claiming ".ts": registration order decides.
        let router = Router::new(vec![
            Arc::new(typescript::TypeScriptAdapter::new()),
            Arc::new(typescript::TypeScriptAdapter::new()),
        ]);
        let first = router.route("a.ts").unwrap();
        assert!(Arc::ptr_eq(first, &router.adapters[0]));
    }

    #[test]
    fn test_default_adapter_count() {
        let router = Router::with_default_adapters();
        assert_eq!(router.len(), 5);
        assert!(!router.is_empty());
    }

    #[test]
    fn test_dispose_all_is_idempotent() {
        let router = Router::with_default_adapters();
        router.dispose_all();
        router.dispose_all();
        // Adapters re-acquire engines lazily after dispose.
        let result = router.route("a.py").unwrap().parse_file("def f(): pass", "a.py");
        assert_eq!(result.functions.len(), 1);
    }
}
