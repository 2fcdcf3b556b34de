//! End-to-end parsing tests through the router, one scenario per language.

use stackscout::cache::TreeCache;
use stackscout::incremental;
use stackscout::types::{ExportKind, Language};
use stackscout::Router;

fn parse(router: &Router, path: &str, content: &str) -> stackscout::ParseResult {
    router
        .route(path)
        .unwrap_or_else(|| panic!("no adapter for {}", path))
        .parse_file(content, path)
}

#[test]
fn typescript_full_extraction() {
    let router = Router::with_default_adapters();
    let source = r#"
import React, { useState } from 'react';
import { Router } from 'express';

export const MAX_ITEMS = 50;

export async function loadItems(page: number, size: number): Promise<void> {}

export default class ItemStore {
    refresh() {}
}
"#;
    let result = parse(&router, "store.ts", source);
    assert_eq!(result.language, Language::TypeScript);
    assert!(result.diagnostics.is_empty());

    assert_eq!(result.imports.len(), 2);
    assert!(result.imports[0].is_default);
    assert_eq!(result.imports[0].imported_names, vec!["React", "useState"]);

    let load = result
        .functions
        .iter()
        .find(|f| f.name == "loadItems")
        .unwrap();
    assert!(load.is_async && load.is_exported);
    assert_eq!(load.param_count, 2);

    assert!(result
        .exports
        .iter()
        .any(|e| e.name == "MAX_ITEMS" && e.kind == ExportKind::Const));
    assert!(result
        .exports
        .iter()
        .any(|e| e.name == "ItemStore" && e.kind == ExportKind::Default));
}

#[test]
fn python_full_extraction() {
    let router = Router::with_default_adapters();
    let source = r#"
from fastapi import FastAPI

APP_NAME = "svc"

app_config = {}

class Settings:
    pass

async def startup():
    pass

def _hidden():
    pass
"#;
    let result = parse(&router, "svc.py", source);
    assert_eq!(result.language, Language::Python);

    assert_eq!(result.imports.len(), 1);
    assert_eq!(result.imports[0].module, "fastapi");

    let names: Vec<&str> = result.exports.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["APP_NAME", "Settings", "startup"]);

    let startup = result
        .functions
        .iter()
        .find(|f| f.name == "startup")
        .unwrap();
    assert!(startup.is_async);
}

#[test]
fn go_full_extraction() {
    let router = Router::with_default_adapters();
    let source = r#"
package api

import "github.com/gin-gonic/gin"

const Version = "1.0"

type Router struct{}

func Register(engine *gin.Engine) {}

func setup() {}
"#;
    let result = parse(&router, "api.go", source);
    assert_eq!(result.language, Language::Go);

    assert_eq!(result.imports[0].module, "github.com/gin-gonic/gin");
    let names: Vec<&str> = result.exports.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"Version"));
    assert!(names.contains(&"Router"));
    assert!(names.contains(&"Register"));
    assert!(!names.contains(&"setup"));
}

#[test]
fn rust_full_extraction() {
    let router = Router::with_default_adapters();
    let source = r#"
use tokio::sync::Mutex;

pub struct Registry;

pub async fn serve(addr: &str, registry: Registry) {}

fn internal() {}
"#;
    let result = parse(&router, "lib.rs", source);
    assert_eq!(result.language, Language::Rust);

    assert_eq!(result.imports[0].module, "tokio");
    assert_eq!(result.imports[0].imported_names, vec!["Mutex"]);

    let serve = result.functions.iter().find(|f| f.name == "serve").unwrap();
    assert!(serve.is_async && serve.is_exported);
    assert_eq!(serve.param_count, 2);
    assert!(result
        .exports
        .iter()
        .any(|e| e.name == "Registry" && e.kind == ExportKind::Class));
}

#[test]
fn java_full_extraction() {
    let router = Router::with_default_adapters();
    let source = r#"
import org.springframework.stereotype.Service;

public class UserService {
    public UserService() {}

    public String find(long id) { return null; }
}
"#;
    let result = parse(&router, "UserService.java", source);
    assert_eq!(result.language, Language::Java);

    assert_eq!(result.imports[0].module, "org.springframework.stereotype");
    assert!(result
        .exports
        .iter()
        .any(|e| e.name == "UserService" && e.kind == ExportKind::Class));
    let find = result.functions.iter().find(|f| f.name == "find").unwrap();
    assert_eq!(find.param_count, 1);
    assert!(find.is_exported);
}

#[test]
fn parsing_is_deterministic_across_adapters() {
    let router = Router::with_default_adapters();
    let cases = [
        ("a.ts", "import a from 'a';\nexport function f(x) {}\n"),
        ("b.py", "import os\n\ndef g(a, b):\n    pass\n"),
        ("c.go", "package p\n\nfunc H(x int) {}\n"),
        ("d.rs", "pub fn i(y: u8) {}\n"),
        ("E.java", "public class E { void j(int k) {} }\n"),
    ];
    for (path, content) in cases {
        let first = parse(&router, path, content);
        let second = parse(&router, path, content);
        assert_eq!(first, second, "non-deterministic output for {}", path);
    }
}

#[test]
fn malformed_files_never_error() {
    let router = Router::with_default_adapters();
    let cases = [
        ("a.ts", "function broken( {"),
        ("b.py", "def broken(:\n"),
        ("c.go", "func broken( {"),
        ("d.rs", "pub fn broken( {"),
        ("E.java", "public class Broken {"),
    ];
    for (path, content) in cases {
        let result = parse(&router, path, content);
        assert!(
            !result.diagnostics.is_empty(),
            "expected diagnostics for {}",
            path
        );
    }
}

#[test]
fn incremental_reparse_matches_full_for_each_language() {
    let router = Router::with_default_adapters();
    let cases = [
        (
            "a.ts",
            "export function one() {}\n",
            "export function one() {}\nexport function two(a) {}\n",
        ),
        (
            "b.py",
            "def one():\n    pass\n",
            "def one():\n    pass\n\ndef two(a):\n    pass\n",
        ),
        (
            "c.go",
            "package p\n\nfunc One() {}\n",
            "package p\n\nfunc One() {}\n\nfunc Two(a int) {}\n",
        ),
        (
            "d.rs",
            "pub fn one() {}\n",
            "pub fn one() {}\n\npub fn two(a: u8) {}\n",
        ),
        (
            "E.java",
            "public class E { void one() {} }\n",
            "public class E { void one() {} void two(int a) {} }\n",
        ),
    ];

    for (path, old, new) in cases {
        let adapter = router.route(path).unwrap();
        let mut cache = TreeCache::new(8);

        let seeded = incremental::reparse(adapter.as_ref(), &mut cache, path, "", old);
        assert_eq!(seeded.functions.len(), 1, "seed failed for {}", path);

        let warm = incremental::reparse(adapter.as_ref(), &mut cache, path, old, new);
        let cold = adapter.parse_file(new, path);
        assert!(
            warm.same_facts(&cold),
            "incremental diverged from full reparse for {}",
            path
        );
        assert_eq!(warm.functions.len(), 2);
    }
}
