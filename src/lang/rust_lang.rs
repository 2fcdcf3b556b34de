//! Rust adapter.
//!
//! Items carrying a `pub` visibility modifier form the exported surface.
//! Functions inside `impl` and `trait` blocks are recorded as functions but
//! kept out of the export list, which describes module-level items.

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor, Tree};

use super::treesitter::{self, SyntaxEngine};
use super::Adapter;
use crate::types::{
    Diagnostic, ExportInfo, ExportKind, FrameworkRule, FunctionInfo, ImportInfo, Language,
    ParseResult,
};

const NODE_QUERY: &str = r#"
(use_declaration) @import
(function_item) @function
(struct_item) @struct
(enum_item) @struct
(trait_item) @trait
(type_item) @trait
(const_item) @const
(static_item) @const
"#;

pub static FRAMEWORK_RULES: &[FrameworkRule] = &[
    FrameworkRule {
        name: "Tokio",
        dependency_indicators: &["tokio"],
        import_indicators: &["tokio"],
    },
    FrameworkRule {
        name: "Actix Web",
        dependency_indicators: &["actix-web"],
        import_indicators: &["actix_web"],
    },
    FrameworkRule {
        name: "Axum",
        dependency_indicators: &["axum"],
        import_indicators: &["axum"],
    },
    FrameworkRule {
        name: "Serde",
        dependency_indicators: &["serde"],
        import_indicators: &["serde"],
    },
];

pub struct RustAdapter {
    engine: SyntaxEngine,
    query: OnceCell<Query>,
}

impl RustAdapter {
    pub fn new() -> Self {
        Self {
            engine: SyntaxEngine::new(tree_sitter_rust::LANGUAGE.into()),
            query: OnceCell::new(),
        }
    }
}

impl Default for RustAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for RustAdapter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn framework_rules(&self) -> &'static [FrameworkRule] {
        FRAMEWORK_RULES
    }

    fn parse_incremental(
        &self,
        content: &str,
        _path: &str,
        previous: Option<&Tree>,
    ) -> (ParseResult, Option<Tree>) {
        let mut result = ParseResult::empty(Language::Rust);

        let tree = match self.engine.parse(content, previous) {
            Some(t) => t,
            None => {
                result
                    .diagnostics
                    .push(Diagnostic::new("tree-sitter parser failed", None));
                return (result, None);
            }
        };
        result.diagnostics = treesitter::error_diagnostics(&tree);

        match self.engine.compiled_query(&self.query, NODE_QUERY) {
            Ok(query) => {
                let mut cursor = QueryCursor::new();
                let mut matches = cursor.matches(query, tree.root_node(), content.as_bytes());
                while let Some(m) = matches.next() {
                    for capture in m.captures {
                        let node = capture.node;
                        match query.capture_names()[capture.index as usize] {
                            "import" => collect_use(node, content, &mut result.imports),
                            "function" => collect_function(node, content, &mut result),
                            "struct" => {
                                collect_item(node, content, ExportKind::Class, &mut result.exports)
                            }
                            "trait" => {
                                collect_item(node, content, ExportKind::Type, &mut result.exports)
                            }
                            "const" => {
                                collect_item(node, content, ExportKind::Const, &mut result.exports)
                            }
                            _ => {}
                        }
                    }
                }
            }
            Err(e) => result.diagnostics.push(Diagnostic::new(e, None)),
        }

        result.normalize();
        (result, Some(tree))
    }

    fn dispose(&self) {
        self.engine.dispose();
    }
}

fn is_pub(node: Node) -> bool {
    treesitter::has_child_token(node, "visibility_modifier")
}

fn is_async_fn(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| c.kind() == "function_modifiers" && treesitter::has_child_token(c, "async"));
    found
}

fn collect_use(node: Node, content: &str, out: &mut Vec<ImportInfo>) {
    let argument = match node.child_by_field_name("argument") {
        Some(a) => a,
        None => return,
    };
    // First path segment identifies the crate or root (`std`, `crate`, ...).
    let module = treesitter::node_text(argument, content)
        .split("::")
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    if module.is_empty() {
        return;
    }

    let mut imported_names = Vec::new();
    collect_use_leaves(argument, content, &mut imported_names);
    // A bare `use serde;` imports the crate itself, not a named item.
    if imported_names.len() == 1 && imported_names[0] == module {
        imported_names.clear();
    }

    out.push(ImportInfo {
        module,
        imported_names,
        is_default: false,
        line: treesitter::start_line(node),
    });
}

fn collect_use_leaves(node: Node, content: &str, out: &mut Vec<String>) {
    match node.kind() {
        "identifier" => out.push(treesitter::node_text(node, content).to_string()),
        "scoped_identifier" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.push(treesitter::node_text(name, content).to_string());
            }
        }
        "scoped_use_list" => {
            if let Some(list) = node.child_by_field_name("list") {
                collect_use_leaves(list, content, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_use_leaves(child, content, out);
            }
        }
        "use_as_clause" => {
            if let Some(alias) = node.child_by_field_name("alias") {
                out.push(treesitter::node_text(alias, content).to_string());
            }
        }
        "use_wildcard" => out.push("*".to_string()),
        _ => {}
    }
}

fn collect_function(node: Node, content: &str, result: &mut ParseResult) {
    let name = match node.child_by_field_name("name") {
        Some(n) => treesitter::node_text(n, content).to_string(),
        None => return,
    };

    let param_count = node
        .child_by_field_name("parameters")
        .map(|params| {
            let mut cursor = params.walk();
            params
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "parameter")
                .count()
        })
        .unwrap_or(0);

    let public = is_pub(node);
    let in_block = treesitter::has_ancestor(node, "impl_item")
        || treesitter::has_ancestor(node, "trait_item");

    result.functions.push(FunctionInfo {
        name: name.clone(),
        param_count,
        is_async: is_async_fn(node),
        is_exported: public,
        start_line: treesitter::start_line(node),
        end_line: treesitter::end_line(node),
    });

    if public && !in_block {
        result.exports.push(ExportInfo {
            name,
            kind: ExportKind::Function,
            line: treesitter::start_line(node),
        });
    }
}

fn collect_item(node: Node, content: &str, kind: ExportKind, out: &mut Vec<ExportInfo>) {
    if !is_pub(node) {
        return;
    }
    let name = match node.child_by_field_name("name") {
        Some(n) => treesitter::node_text(n, content).to_string(),
        None => return,
    };
    out.push(ExportInfo {
        name,
        kind,
        line: treesitter::start_line(node),
    });
}
