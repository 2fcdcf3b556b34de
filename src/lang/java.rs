//! Java adapter.
//!
//! `public` top-level types form the export list; methods and constructors
//! are recorded as functions with `is_exported` reflecting their `public`
//! modifier.

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
(import_declaration) @import
(class_declaration) @class
(record_declaration) @class
(interface_declaration) @iface
(enum_declaration) @iface
(method_declaration) @method
(constructor_declaration) @method
"#;

pub static FRAMEWORK_RULES: &[FrameworkRule] = &[
    FrameworkRule {
        name: "Spring",
        dependency_indicators: &["org.springframework"],
        import_indicators: &["org.springframework"],
    },
    FrameworkRule {
        name: "JUnit",
        dependency_indicators: &["junit", "org.junit.jupiter"],
        import_indicators: &["org.junit"],
    },
    FrameworkRule {
        name: "Hibernate",
        dependency_indicators: &["org.hibernate"],
        import_indicators: &["org.hibernate"],
    },
];

pub struct JavaAdapter {
    engine: SyntaxEngine,
    query: OnceCell<Query>,
}

impl JavaAdapter {
    pub fn new() -> Self {
        Self {
            engine: SyntaxEngine::new(tree_sitter_java::LANGUAGE.into()),
            query: OnceCell::new(),
        }
    }
}

impl Default for JavaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for JavaAdapter {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
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
        let mut result = ParseResult::empty(Language::Java);

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
                            "class" => {
                                collect_type(node, content, ExportKind::Class, &mut result.exports)
                            }
                            "iface" => {
                                collect_type(node, content, ExportKind::Type, &mut result.exports)
                            }
                            "method" => collect_method(node, content, &mut result.functions),
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

fn is_public(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| c.kind() == "modifiers" && treesitter::has_child_token(c, "public"));
    found
}

/// `import java.util.List;` -> module `java.util`, name `List`.
/// `import java.util.*;` -> module `java.util`, name `*`.
fn collect_import(node: Node, content: &str, out: &mut Vec<ImportInfo>) {
    let mut path = String::new();
    let mut wildcard = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "scoped_identifier" | "identifier" => {
                path = treesitter::node_text(child, content).to_string();
            }
            "asterisk" => wildcard = true,
            _ => {}
        }
    }
    if path.is_empty() {
        return;
    }

    let (module, name) = if wildcard {
        (path, "*".to_string())
    } else {
        match path.rsplit_once('.') {
            Some((package, last)) => (package.to_string(), last.to_string()),
            None => (path.clone(), path),
        }
    };

    out.push(ImportInfo {
        module,
        imported_names: vec![name],
        is_default: false,
        line: treesitter::start_line(node),
    });
}

fn collect_type(node: Node, content: &str, kind: ExportKind, out: &mut Vec<ExportInfo>) {
    if !is_public(node) {
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

fn collect_method(node: Node, content: &str, out: &mut Vec<FunctionInfo>) {
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
                .filter(|c| matches!(c.kind(), "formal_parameter" | "spread_parameter"))
                .count()
        })
        .unwrap_or(0);

    out.push(FunctionInfo {
        name,
        param_count,
        is_async: false,
        is_exported: is_public(node),
        start_line: treesitter::start_line(node),
        end_line: treesitter::end_line(node),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
import java.util.List;
import java.util.*;
import org.springframework.boot.SpringApplication;

public class OrderService {
    public OrderService(Repository repo) {}

    public List<Order> findAll(int limit, String sort) {
        return null;
    }

    private void audit() {}
}

interface Internal {}

public interface OrderRepository {}
"#;

    #[test]
    fn test_imports() {
        let adapter = JavaAdapter::new();
        let result = adapter.parse_file(SOURCE, "OrderService.java");

        assert_eq!(result.imports.len(), 3);
        assert_eq!(result.imports[0].module, "java.util");
        assert_eq!(result.imports[0].imported_names, vec!["List"]);
        assert_eq!(result.imports[1].module, "java.util");
        assert_eq!(result.imports[1].imported_names, vec!["*"]);
        assert_eq!(result.imports[2].module, "org.springframework.boot");
        assert_eq!(result.imports[2].imported_names, vec!["SpringApplication"]);
    }

    #[test]
    fn test_public_types() {
        let adapter = JavaAdapter::new();
        let result = adapter.parse_file(SOURCE, "OrderService.java");

        let kind_of = |name: &str| {
            result
                .exports
                .iter()
                .find(|e| e.name == name)
                .map(|e| e.kind)
        };
        assert_eq!(kind_of("OrderService"), Some(ExportKind::Class));
        assert_eq!(kind_of("OrderRepository"), Some(ExportKind::Type));
        assert_eq!(kind_of("Internal"), None);
    }

    #[test]
    fn test_methods() {
        let adapter = JavaAdapter::new();
        let result = adapter.parse_file(SOURCE, "OrderService.java");

        let find_all = result.functions.iter().find(|f| f.name == "findAll").unwrap();
        assert!(find_all.is_exported);
        assert_eq!(find_all.param_count, 2);
        assert!(!find_all.is_async);

        let ctor = result
            .functions
            .iter()
            .find(|f| f.name == "OrderService")
            .unwrap();
        assert_eq!(ctor.param_count, 1);

        let audit = result.functions.iter().find(|f| f.name == "audit").unwrap();
        assert!(!audit.is_exported);
    }

    #[test]
    fn test_malformed_input_yields_diagnostics() {
        let adapter = JavaAdapter::new();
        let result = adapter.parse_file("public class Broken {", "Broken.java");
        assert!(!result.diagnostics.is_empty());
    }
}
