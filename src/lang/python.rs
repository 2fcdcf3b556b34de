//! Python adapter.
//!
//! Python has no export syntax; module-level definitions whose names do not
//! start with an underscore are treated as the module's public surface.

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
(import_statement) @import
(import_from_statement) @from_import
(function_definition) @function
(class_definition) @class
(module (expression_statement (assignment) @assign))
"#;

pub static FRAMEWORK_RULES: &[FrameworkRule] = &[
    FrameworkRule {
        name: "Django",
        dependency_indicators: &["django"],
        import_indicators: &["django"],
    },
    FrameworkRule {
        name: "Flask",
        dependency_indicators: &["flask"],
        import_indicators: &["flask"],
    },
    FrameworkRule {
        name: "FastAPI",
        dependency_indicators: &["fastapi"],
        import_indicators: &["fastapi"],
    },
    FrameworkRule {
        name: "SQLAlchemy",
        dependency_indicators: &["sqlalchemy"],
        import_indicators: &["sqlalchemy"],
    },
];

pub struct PythonAdapter {
    engine: SyntaxEngine,
    query: OnceCell<Query>,
}

impl PythonAdapter {
    pub fn new() -> Self {
        Self {
            engine: SyntaxEngine::new(tree_sitter_python::LANGUAGE.into()),
            query: OnceCell::new(),
        }
    }
}

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
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
        let mut result = ParseResult::empty(Language::Python);

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
                            "import" => collect_plain_import(node, content, &mut result.imports),
                            "from_import" => {
                                collect_from_import(node, content, &mut result.imports)
                            }
                            "function" => {
                                collect_function(node, content, &mut result);
                            }
                            "class" => collect_class(node, content, &mut result.exports),
                            "assign" => collect_constant(node, content, &mut result.exports),
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

/// Whether a definition sits at module level (decorators allowed in between).
fn is_module_level(node: Node) -> bool {
    match node.parent() {
        Some(parent) if parent.kind() == "module" => true,
        Some(parent) if parent.kind() == "decorated_definition" => is_module_level(parent),
        _ => false,
    }
}

fn is_public(name: &str) -> bool {
    !name.starts_with('_')
}

/// `import a.b, c as d`
fn collect_plain_import(node: Node, content: &str, out: &mut Vec<ImportInfo>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let module = match child.kind() {
            "dotted_name" => treesitter::node_text(child, content).to_string(),
            "aliased_import" => child
                .child_by_field_name("name")
                .map(|n| treesitter::node_text(n, content).to_string())
                .unwrap_or_default(),
            _ => continue,
        };
        if module.is_empty() {
            continue;
        }
        out.push(ImportInfo {
            module,
            imported_names: Vec::new(),
            is_default: false,
            line: treesitter::start_line(node),
        });
    }
}

/// `from a.b import c, d as e` and `from . import f`
fn collect_from_import(node: Node, content: &str, out: &mut Vec<ImportInfo>) {
    let module = node
        .child_by_field_name("module_name")
        .map(|n| treesitter::node_text(n, content).to_string())
        .unwrap_or_default();
    if module.is_empty() {
        return;
    }

    let mut imported_names = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        // The module name itself is a named child too; skip it.
        if Some(child) == node.child_by_field_name("module_name") {
            continue;
        }
        match child.kind() {
            "dotted_name" => {
                imported_names.push(treesitter::node_text(child, content).to_string());
            }
            "aliased_import" => {
                if let Some(name) = child.child_by_field_name("name") {
                    imported_names.push(treesitter::node_text(name, content).to_string());
                }
            }
            "wildcard_import" => imported_names.push("*".to_string()),
            _ => {}
        }
    }

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
        .map(|params| {
            let mut cursor = params.walk();
            let named: Vec<Node> = params
                .named_children(&mut cursor)
                .filter(|c| c.kind() != "comment")
                .collect();
            let receiver = named
                .first()
                .map(|p| {
                    let text = treesitter::node_text(*p, content);
                    text == "self" || text == "cls"
                })
                .unwrap_or(false);
            named.len() - usize::from(receiver)
        })
        .unwrap_or(0);

    let module_level = is_module_level(node);
    let exported = module_level && is_public(&name);

    result.functions.push(FunctionInfo {
        name: name.clone(),
        param_count,
        is_async: treesitter::has_child_token(node, "async"),
        is_exported: exported,
        start_line: treesitter::start_line(node),
        end_line: treesitter::end_line(node),
    });

    if exported {
        result.exports.push(ExportInfo {
            name,
            kind: ExportKind::Function,
            line: treesitter::start_line(node),
        });
    }
}

fn collect_class(node: Node, content: &str, out: &mut Vec<ExportInfo>) {
    if !is_module_level(node) {
        return;
    }
    let name = match node.child_by_field_name("name") {
        Some(n) => treesitter::node_text(n, content).to_string(),
        None => return,
    };
    if !is_public(&name) {
        return;
    }
    out.push(ExportInfo {
        name,
        kind: ExportKind::Class,
        line: treesitter::start_line(node),
    });
}

/// Module-level `NAME = value` assignments with SCREAMING_CASE names count
/// as constants.
fn collect_constant(node: Node, content: &str, out: &mut Vec<ExportInfo>) {
    let left = match node.child_by_field_name("left") {
        Some(n) if n.kind() == "identifier" => n,
        _ => return,
    };
    let name = treesitter::node_text(left, content);
    let screaming = name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if !screaming {
        return;
    }
    out.push(ExportInfo {
        name: name.to_string(),
        kind: ExportKind::Const,
        line: treesitter::start_line(node),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imports() {
        let adapter = PythonAdapter::new();
        let source = "import os\nimport numpy as np\nfrom django.db import models, transaction\nfrom . import util\n";
        let result = adapter.parse_file(source, "app.py");

        assert_eq!(result.imports.len(), 4);
        assert_eq!(result.imports[0].module, "os");
        assert_eq!(result.imports[1].module, "numpy");
        let from_import = &result.imports[2];
        assert_eq!(from_import.module, "django.db");
        assert_eq!(from_import.imported_names, vec!["models", "transaction"]);
        assert_eq!(result.imports[3].module, ".");
        assert_eq!(result.imports[3].imported_names, vec!["util"]);
    }

    #[test]
    fn test_public_surface() {
        let adapter = PythonAdapter::new();
        let source = r#"
MAX_SIZE = 100
_internal = 1

def handler(request):
    pass

def _private():
    pass

class Model:
    def method(self, x):
        pass

async def fetch(url, timeout):
    pass
"#;
        let result = adapter.parse_file(source, "app.py");

        let names: Vec<&str> = result.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"MAX_SIZE"));
        assert!(names.contains(&"handler"));
        assert!(names.contains(&"Model"));
        assert!(names.contains(&"fetch"));
        assert!(!names.contains(&"_private"));
        assert!(!names.contains(&"_internal"));
        assert!(!names.contains(&"method"));

        let kind_of = |name: &str| {
            result
                .exports
                .iter()
                .find(|e| e.name == name)
                .map(|e| e.kind)
        };
        assert_eq!(kind_of("MAX_SIZE"), Some(ExportKind::Const));
        assert_eq!(kind_of("Model"), Some(ExportKind::Class));
        assert_eq!(kind_of("handler"), Some(ExportKind::Function));
    }

    #[test]
    fn test_functions() {
        let adapter = PythonAdapter::new();
        let source = r#"
async def fetch(url, timeout=5):
    pass

class Service:
    def handle(self, request, context):
        pass
"#;
        let result = adapter.parse_file(source, "app.py");

        let fetch = result.functions.iter().find(|f| f.name == "fetch").unwrap();
        assert!(fetch.is_async);
        assert!(fetch.is_exported);
        assert_eq!(fetch.param_count, 2);

        // self is not counted
        let handle = result.functions.iter().find(|f| f.name == "handle").unwrap();
        assert!(!handle.is_async);
        assert!(!handle.is_exported);
        assert_eq!(handle.param_count, 2);
    }

    #[test]
    fn test_malformed_input_yields_diagnostics() {
        let adapter = PythonAdapter::new();
        let result = adapter.parse_file("def broken(:\n", "bad.py");
        assert!(!result.diagnostics.is_empty());
    }
}
