//! TypeScript/JavaScript adapter.
//!
//! One adapter covers the whole family: `.ts` uses the TypeScript grammar,
//! `.tsx`/`.jsx`/`.js` use the TSX grammar (a superset that also handles
//! plain JavaScript).

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor, Tree};

use super::treesitter::{self, SyntaxEngine};
use super::Adapter;
use crate::types::{
    Diagnostic, ExportInfo, ExportKind, FrameworkRule, FunctionInfo, ImportInfo, Language,
    ParseResult,
};

/// Top-level nodes of interest; each match is walked for details.
const NODE_QUERY: &str = r#"
(import_statement) @import
(export_statement) @export
(function_declaration) @function
(generator_function_declaration) @function
(method_definition) @method
"#;

/// Framework signatures for the JS/TS ecosystem.
pub static FRAMEWORK_RULES: &[FrameworkRule] = &[
    FrameworkRule {
        name: "React",
        dependency_indicators: &["react", "react-dom"],
        import_indicators: &["react", "react-dom"],
    },
    FrameworkRule {
        name: "Next.js",
        dependency_indicators: &["next"],
        import_indicators: &["next"],
    },
    FrameworkRule {
        name: "Vue",
        dependency_indicators: &["vue"],
        import_indicators: &["vue"],
    },
    FrameworkRule {
        name: "Angular",
        dependency_indicators: &["@angular/core"],
        import_indicators: &["@angular/core"],
    },
    FrameworkRule {
        name: "Express",
        dependency_indicators: &["express"],
        import_indicators: &["express"],
    },
    FrameworkRule {
        name: "NestJS",
        dependency_indicators: &["@nestjs/core", "@nestjs/common"],
        import_indicators: &["@nestjs/core", "@nestjs/common"],
    },
];

pub struct TypeScriptAdapter {
    ts: SyntaxEngine,
    tsx: SyntaxEngine,
    ts_query: OnceCell<Query>,
    tsx_query: OnceCell<Query>,
}

impl TypeScriptAdapter {
    pub fn new() -> Self {
        Self {
            ts: SyntaxEngine::new(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            tsx: SyntaxEngine::new(tree_sitter_typescript::LANGUAGE_TSX.into()),
            ts_query: OnceCell::new(),
            tsx_query: OnceCell::new(),
        }
    }

    /// `.ts` gets the strict TypeScript grammar; everything else TSX.
    fn engine_for(&self, path: &str) -> (&SyntaxEngine, &OnceCell<Query>) {
        if path.ends_with(".ts") {
            (&self.ts, &self.ts_query)
        } else {
            (&self.tsx, &self.tsx_query)
        }
    }
}

impl Default for TypeScriptAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for TypeScriptAdapter {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "js", "jsx"]
    }

    fn framework_rules(&self) -> &'static [FrameworkRule] {
        FRAMEWORK_RULES
    }

    fn parse_incremental(
        &self,
        content: &str,
        path: &str,
        previous: Option<&Tree>,
    ) -> (ParseResult, Option<Tree>) {
        let (engine, query_cell) = self.engine_for(path);
        let mut result = ParseResult::empty(Language::TypeScript);

        let tree = match engine.parse(content, previous) {
            Some(t) => t,
            None => {
                result
                    .diagnostics
                    .push(Diagnostic::new("tree-sitter parser failed", None));
                return (result, None);
            }
        };
        result.diagnostics = treesitter::error_diagnostics(&tree);

        match engine.compiled_query(query_cell, NODE_QUERY) {
            Ok(query) => {
                let mut cursor = QueryCursor::new();
                let mut matches = cursor.matches(query, tree.root_node(), content.as_bytes());
                while let Some(m) = matches.next() {
                    for capture in m.captures {
                        let name = query.capture_names()[capture.index as usize];
                        match name {
                            "import" => collect_import(capture.node, content, &mut result.imports),
                            "export" => collect_exports(capture.node, content, &mut result.exports),
                            "function" | "method" => {
                                collect_function(capture.node, content, &mut result.functions)
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
        self.ts.dispose();
        self.tsx.dispose();
    }
}

/// Text content of a string literal node, without quotes.
fn string_content<'a>(node: Node, content: &'a str) -> &'a str {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "string_fragment" {
            return treesitter::node_text(child, content);
        }
    }
    treesitter::node_text(node, content).trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

fn collect_import(node: Node, content: &str, out: &mut Vec<ImportInfo>) {
    let module = match node.child_by_field_name("source") {
        Some(source) => string_content(source, content).to_string(),
        None => return,
    };
    if module.is_empty() {
        return;
    }

    let mut imported_names = Vec::new();
    let mut is_default = false;

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "import_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for item in child.named_children(&mut clause_cursor) {
            match item.kind() {
                // `import React from "react"`
                "identifier" => {
                    is_default = true;
                    imported_names.push(treesitter::node_text(item, content).to_string());
                }
                // `import { a, b as c } from "m"`
                "named_imports" => {
                    let mut spec_cursor = item.walk();
                    for spec in item.named_children(&mut spec_cursor) {
                        if spec.kind() == "import_specifier" {
                            if let Some(name) = spec.child_by_field_name("name") {
                                imported_names
                                    .push(treesitter::node_text(name, content).to_string());
                            }
                        }
                    }
                }
                // `import * as ns from "m"`
                "namespace_import" => {
                    let mut ns_cursor = item.walk();
                    for ns in item.named_children(&mut ns_cursor) {
                        if ns.kind() == "identifier" {
                            imported_names.push(treesitter::node_text(ns, content).to_string());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    out.push(ImportInfo {
        module,
        imported_names,
        is_default,
        line: treesitter::start_line(node),
    });
}

fn collect_exports(node: Node, content: &str, out: &mut Vec<ExportInfo>) {
    let line = treesitter::start_line(node);

    if treesitter::has_child_token(node, "default") {
        // `export default <expr|declaration>`: name the declaration if named.
        let name = node
            .child_by_field_name("declaration")
            .and_then(|d| d.child_by_field_name("name"))
            .map(|n| treesitter::node_text(n, content).to_string())
            .unwrap_or_else(|| "default".to_string());
        out.push(ExportInfo {
            name,
            kind: ExportKind::Default,
            line,
        });
        return;
    }

    if let Some(decl) = node.child_by_field_name("declaration") {
        match decl.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = decl.child_by_field_name("name") {
                    out.push(ExportInfo {
                        name: treesitter::node_text(name, content).to_string(),
                        kind: ExportKind::Function,
                        line,
                    });
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name) = decl.child_by_field_name("name") {
                    out.push(ExportInfo {
                        name: treesitter::node_text(name, content).to_string(),
                        kind: ExportKind::Class,
                        line,
                    });
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = decl.walk();
                for declarator in decl.named_children(&mut cursor) {
                    if declarator.kind() == "variable_declarator" {
                        if let Some(name) = declarator.child_by_field_name("name") {
                            out.push(ExportInfo {
                                name: treesitter::node_text(name, content).to_string(),
                                kind: ExportKind::Const,
                                line,
                            });
                        }
                    }
                }
            }
            "interface_declaration" | "type_alias_declaration" | "enum_declaration" => {
                if let Some(name) = decl.child_by_field_name("name") {
                    out.push(ExportInfo {
                        name: treesitter::node_text(name, content).to_string(),
                        kind: ExportKind::Type,
                        line,
                    });
                }
            }
            _ => {}
        }
        return;
    }

    // `export { a, b as c }` - kinds are unknown without resolution, so
    // they are reported as const re-exports.
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "export_clause" {
            continue;
        }
        let mut spec_cursor = child.walk();
        for spec in child.named_children(&mut spec_cursor) {
            if spec.kind() == "export_specifier" {
                let name = spec
                    .child_by_field_name("alias")
                    .or_else(|| spec.child_by_field_name("name"));
                if let Some(name) = name {
                    out.push(ExportInfo {
                        name: treesitter::node_text(name, content).to_string(),
                        kind: ExportKind::Const,
                        line: treesitter::start_line(spec),
                    });
                }
            }
        }
    }
}

fn collect_function(node: Node, content: &str, out: &mut Vec<FunctionInfo>) {
    let name = match node.child_by_field_name("name") {
        Some(n) => treesitter::node_text(n, content).to_string(),
        None => return,
    };
    if name.is_empty() {
        return;
    }

    let param_count = node
        .child_by_field_name("parameters")
        .map(|p| {
            let mut cursor = p.walk();
            p.named_children(&mut cursor)
                .filter(|c| c.kind() != "comment")
                .count()
        })
        .unwrap_or(0);

    out.push(FunctionInfo {
        name,
        param_count,
        is_async: treesitter::has_child_token(node, "async"),
        is_exported: treesitter::has_ancestor(node, "export_statement"),
        start_line: treesitter::start_line(node),
        end_line: treesitter::end_line(node),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imports() {
        let adapter = TypeScriptAdapter::new();
        let source = r#"
import React from 'react';
import { useState, useEffect } from 'react';
import * as path from 'path';
import 'polyfill';
"#;
        let result = adapter.parse_file(source, "a.ts");
        assert_eq!(result.imports.len(), 4);

        let default_import = &result.imports[0];
        assert_eq!(default_import.module, "react");
        assert!(default_import.is_default);
        assert_eq!(default_import.imported_names, vec!["React"]);

        let named = &result.imports[1];
        assert!(!named.is_default);
        assert_eq!(named.imported_names, vec!["useState", "useEffect"]);

        let namespace = &result.imports[2];
        assert_eq!(namespace.imported_names, vec!["path"]);

        let bare = &result.imports[3];
        assert_eq!(bare.module, "polyfill");
        assert!(bare.imported_names.is_empty());
    }

    #[test]
    fn test_exports() {
        let adapter = TypeScriptAdapter::new();
        let source = r#"
export function build(): void {}
export class Builder {}
export const VERSION = "1.0";
export type Options = { a: number };
export interface Config { b: string }
export default Builder;
"#;
        let result = adapter.parse_file(source, "a.ts");

        let kind_of = |name: &str| {
            result
                .exports
                .iter()
                .find(|e| e.name == name)
                .map(|e| e.kind)
        };
        assert_eq!(kind_of("build"), Some(ExportKind::Function));
        assert_eq!(kind_of("Builder"), Some(ExportKind::Class));
        assert_eq!(kind_of("VERSION"), Some(ExportKind::Const));
        assert_eq!(kind_of("Options"), Some(ExportKind::Type));
        assert_eq!(kind_of("Config"), Some(ExportKind::Type));
        assert!(result
            .exports
            .iter()
            .any(|e| e.kind == ExportKind::Default));
    }

    #[test]
    fn test_functions() {
        let adapter = TypeScriptAdapter::new();
        let source = r#"
async function fetchData(url: string, retries: number): Promise<void> {}

function local() {}

export function run(a: number) {}

class Service {
    async handle(req: Request) {}
}
"#;
        let result = adapter.parse_file(source, "a.ts");

        let fetch = result.functions.iter().find(|f| f.name == "fetchData").unwrap();
        assert!(fetch.is_async);
        assert!(!fetch.is_exported);
        assert_eq!(fetch.param_count, 2);

        let run = result.functions.iter().find(|f| f.name == "run").unwrap();
        assert!(run.is_exported);
        assert_eq!(run.param_count, 1);

        let handle = result.functions.iter().find(|f| f.name == "handle").unwrap();
        assert!(handle.is_async);
        assert_eq!(handle.param_count, 1);
    }

    #[test]
    fn test_jsx_parses_under_tsx_grammar() {
        let adapter = TypeScriptAdapter::new();
        let source = r#"
import React from 'react';
export function App() {
    return <div>hello</div>;
}
"#;
        let result = adapter.parse_file(source, "App.jsx");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.imports.len(), 1);
        assert!(result.functions.iter().any(|f| f.name == "App"));
    }

    #[test]
    fn test_malformed_input_yields_diagnostics_not_panic() {
        let adapter = TypeScriptAdapter::new();
        let result = adapter.parse_file("function broken( {", "a.ts");
        assert!(!result.diagnostics.is_empty());
    }

    #[test]
    fn test_deterministic_output() {
        let adapter = TypeScriptAdapter::new();
        let source = "import a from 'a';\nexport function f(x) {}\n";
        let first = adapter.parse_file(source, "a.ts");
        let second = adapter.parse_file(source, "a.ts");
        assert_eq!(first, second);
    }
}
