//! Go adapter.
//!
//! Visibility follows Go's capitalization rule: identifiers starting with an
//! uppercase letter are exported.

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
(import_spec) @import
(function_declaration) @function
(method_declaration) @method
(type_declaration (type_spec) @type)
(const_declaration (const_spec) @const)
"#;

pub static FRAMEWORK_RULES: &[FrameworkRule] = &[
    FrameworkRule {
        name: "Gin",
        dependency_indicators: &["github.com/gin-gonic/gin"],
        import_indicators: &["github.com/gin-gonic/gin"],
    },
    FrameworkRule {
        name: "Echo",
        dependency_indicators: &["github.com/labstack/echo"],
        import_indicators: &["github.com/labstack/echo"],
    },
    FrameworkRule {
        name: "Cobra",
        dependency_indicators: &["github.com/spf13/cobra"],
        import_indicators: &["github.com/spf13/cobra"],
    },
    FrameworkRule {
        name: "gRPC",
        dependency_indicators: &["google.golang.org/grpc"],
        import_indicators: &["google.golang.org/grpc"],
    },
];

pub struct GoAdapter {
    engine: SyntaxEngine,
    query: OnceCell<Query>,
}

impl GoAdapter {
    pub fn new() -> Self {
        Self {
            engine: SyntaxEngine::new(tree_sitter_go::LANGUAGE.into()),
            query: OnceCell::new(),
        }
    }
}

impl Default for GoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for GoAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
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
        let mut result = ParseResult::empty(Language::Go);

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
                            "import" => collect_import(node, content, &mut result.imports),
                            "function" | "method" => collect_function(node, content, &mut result),
                            "type" => collect_type(node, content, &mut result.exports),
                            "const" => collect_const(node, content, &mut result.exports),
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

fn is_exported_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

fn collect_import(node: Node, content: &str, out: &mut Vec<ImportInfo>) {
    let module = match node.child_by_field_name("path") {
        Some(path) => treesitter::node_text(path, content)
            .trim_matches('"')
            .to_string(),
        None => return,
    };
    if module.is_empty() {
        return;
    }
    // A package alias counts as the single imported name.
    let imported_names = node
        .child_by_field_name("name")
        .map(|n| vec![treesitter::node_text(n, content).to_string()])
        .unwrap_or_default();

    out.push(ImportInfo {
        module,
        imported_names,
        is_default: false,
        line: treesitter::start_line(node),
    });
}

fn collect_function(node: Node, content: &str, result: &mut ParseResult) {
    let name = match node.child_by_field_name("name") {
        Some(n) => treesitter::node_text(n, content).to_string(),
        None => return,
    };

    let param_count = node
        .child_by_field_name("parameters")
        .map(|params| count_parameters(params))
        .unwrap_or(0);

    let exported = is_exported_name(&name);
    let is_method = node.kind() == "method_declaration";

    result.functions.push(FunctionInfo {
        name: name.clone(),
        param_count,
        is_async: false,
        is_exported: exported,
        start_line: treesitter::start_line(node),
        end_line: treesitter::end_line(node),
    });

    if exported && !is_method {
        result.exports.push(ExportInfo {
            name,
            kind: ExportKind::Function,
            line: treesitter::start_line(node),
        });
    }
}

/// One parameter_declaration can declare several names (`a, b int`); a
/// type-only declaration counts as one.
fn count_parameters(params: Node) -> usize {
    let mut total = 0;
    let mut cursor = params.walk();
    for decl in params.named_children(&mut cursor) {
        match decl.kind() {
            "parameter_declaration" | "variadic_parameter_declaration" => {
                let mut names_cursor = decl.walk();
                let names = decl
                    .children_by_field_name("name", &mut names_cursor)
                    .count();
                total += names.max(1);
            }
            _ => {}
        }
    }
    total
}

fn collect_type(node: Node, content: &str, out: &mut Vec<ExportInfo>) {
    let name = match node.child_by_field_name("name") {
        Some(n) => treesitter::node_text(n, content).to_string(),
        None => return,
    };
    if !is_exported_name(&name) {
        return;
    }
    let kind = match node.child_by_field_name("type").map(|t| t.kind()) {
        Some("struct_type") => ExportKind::Class,
        _ => ExportKind::Type,
    };
    out.push(ExportInfo {
        name,
        kind,
        line: treesitter::start_line(node),
    });
}

fn collect_const(node: Node, content: &str, out: &mut Vec<ExportInfo>) {
    let mut cursor = node.walk();
    for name_node in node.children_by_field_name("name", &mut cursor) {
        let name = treesitter::node_text(name_node, content).to_string();
        if is_exported_name(&name) {
            out.push(ExportInfo {
                name,
                kind: ExportKind::Const,
                line: treesitter::start_line(node),
            });
        }
    }
}
