//! Shared tree-sitter machinery for the language adapters.
//!
//! Each adapter owns a [`SyntaxEngine`] holding its grammar and a lazily
//! created parser. Parsers are reused across calls and released by
//! `dispose()`; a parse after dispose re-acquires one.

use std::sync::Mutex;

use once_cell::sync::OnceCell;
use tree_sitter::{Language as TsLanguage, Node, Parser as TsParser, Query, Tree};

use crate::types::Diagnostic;

/// Cap on syntax-error diagnostics reported per file.
const MAX_ERROR_DIAGNOSTICS: usize = 10;

/// Grammar handle plus a reusable parser for one language.
pub struct SyntaxEngine {
    language: TsLanguage,
    parser: Mutex<Option<TsParser>>,
}

impl SyntaxEngine {
    pub fn new(language: TsLanguage) -> Self {
        Self {
            language,
            parser: Mutex::new(None),
        }
    }

    /// The grammar this engine was built with.
    pub fn language(&self) -> &TsLanguage {
        &self.language
    }

    /// Parse source text, reusing `old_tree` for an incremental update when
    /// supplied. Returns `None` only when the parser itself fails (never for
    /// mere syntax errors, which produce a tree with ERROR nodes).
    pub fn parse(&self, content: &str, old_tree: Option<&Tree>) -> Option<Tree> {
        let mut guard = match self.parser.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        if guard.is_none() {
            let mut parser = TsParser::new();
            if parser.set_language(&self.language).is_err() {
                tracing::error!("grammar rejected by tree-sitter runtime");
                return None;
            }
            *guard = Some(parser);
        }

        let parser = guard.as_mut()?;
        parser.parse(content, old_tree)
    }

    /// Drop the held parser. Idempotent.
    pub fn dispose(&self) {
        let mut guard = match self.parser.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }

    /// Compile a query once and reuse it. A compile failure is reported as a
    /// diagnostic by the caller rather than an error.
    pub fn compiled_query<'a>(
        &self,
        cell: &'a OnceCell<Query>,
        source: &str,
    ) -> Result<&'a Query, String> {
        cell.get_or_try_init(|| {
            Query::new(&self.language, source).map_err(|e| format!("query compile failed: {}", e))
        })
    }
}

/// Collect diagnostics for ERROR and MISSING nodes in a parse tree.
///
/// Extraction continues over the valid portions of the tree; these entries
/// record where the grammar lost sync.
pub fn error_diagnostics(tree: &Tree) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    collect_errors(tree.root_node(), &mut diagnostics);
    diagnostics
}

fn collect_errors(node: Node, out: &mut Vec<Diagnostic>) {
    if out.len() >= MAX_ERROR_DIAGNOSTICS {
        return;
    }
    if node.is_error() {
        out.push(Diagnostic::new(
            "syntax error",
            Some(node.start_position().row + 1),
        ));
        return;
    }
    if node.is_missing() {
        out.push(Diagnostic::new(
            format!("missing {}", node.kind()),
            Some(node.start_position().row + 1),
        ));
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, out);
    }
}

/// Text of a node, empty on invalid UTF-8 spans.
pub fn node_text<'a>(node: Node, content: &'a str) -> &'a str {
    node.utf8_text(content.as_bytes()).unwrap_or("")
}

/// 1-indexed start line of a node.
pub fn start_line(node: Node) -> usize {
    node.start_position().row + 1
}

/// 1-indexed end line of a node.
pub fn end_line(node: Node) -> usize {
    node.end_position().row + 1
}

/// Whether any direct child token has the given kind (e.g. "async", "pub").
pub fn has_child_token(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

/// Whether any ancestor of the node has the given kind.
pub fn has_ancestor(node: Node, kind: &str) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == kind {
            return true;
        }
        current = n.parent();
    }
    false
}
