//! Result aggregation and framework detection.
//!
//! Per-file results fold into a codebase-wide context keyed by path, so
//! folding is order-independent and a re-fold after an incremental update
//! simply replaces one entry.

pub mod manifest;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{
    DependencyInfo, FrameworkInfo, FrameworkRule, ParseResult, SourceFile,
};

/// One file's contribution to the codebase context.
#[derive(Debug, Clone, Serialize)]
pub struct FileContext {
    pub source: SourceFile,
    pub result: ParseResult,
}

/// The aggregated view of a scanned codebase.
#[derive(Debug, Clone, Serialize)]
pub struct CodebaseContext {
    /// Per-file results, sorted by path.
    pub files: Vec<FileContext>,
    /// File counts per language name.
    pub files_per_language: BTreeMap<String, usize>,
    pub total_imports: usize,
    pub total_exports: usize,
    pub total_functions: usize,
    /// Non-fatal diagnostics across all files.
    pub total_diagnostics: usize,
    /// Detected frameworks, highest confidence first.
    pub frameworks: Vec<FrameworkInfo>,
    /// Dependencies declared in manifest files at the root.
    pub dependencies: Vec<DependencyInfo>,
}

/// Accumulates per-file results. `fold` is idempotent per path: folding a
/// newer result for the same path replaces the older one.
pub struct Aggregator {
    entries: BTreeMap<String, FileContext>,
    dependencies: Vec<DependencyInfo>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn fold(&mut self, source: SourceFile, result: ParseResult) {
        self.entries
            .insert(source.path.clone(), FileContext { source, result });
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<DependencyInfo>) {
        self.dependencies = dependencies;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce the final context. Consumes the aggregator; totals and
    /// framework detection are computed once here.
    pub fn finish(self, rules: &[FrameworkRule]) -> CodebaseContext {
        let files: Vec<FileContext> = self.entries.into_values().collect();

        let mut files_per_language = BTreeMap::new();
        let mut total_imports = 0;
        let mut total_exports = 0;
        let mut total_functions = 0;
        let mut total_diagnostics = 0;
        for file in &files {
            *files_per_language
                .entry(file.source.language.as_str().to_string())
                .or_insert(0) += 1;
            total_imports += file.result.imports.len();
            total_exports += file.result.exports.len();
            total_functions += file.result.functions.len();
            total_diagnostics += file.result.diagnostics.len();
        }

        let frameworks = detect_frameworks(rules, &files, &self.dependencies);

        CodebaseContext {
            files,
            files_per_language,
            total_imports,
            total_exports,
            total_functions,
            total_diagnostics,
            frameworks,
            dependencies: self.dependencies,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether an import module refers to an indicator package. Covers exact
/// names, subpath imports (`next/router`) and dotted packages
/// (`django.db`).
fn import_matches(module: &str, indicator: &str) -> bool {
    module == indicator
        || module
            .strip_prefix(indicator)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('.'))
}

/// Whether a declared dependency refers to an indicator. Maven coordinates
/// use `group:artifact`, so `:` also separates.
fn dependency_matches(name: &str, indicator: &str) -> bool {
    name == indicator
        || name
            .strip_prefix(indicator)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('.') || rest.starts_with(':'))
}

/// Run every rule over the manifest dependencies and the per-file imports.
///
/// Confidence is `min(1.0, 0.4 * evidence_count)`; ties keep rule
/// registration order (the sort is stable).
pub fn detect_frameworks(
    rules: &[FrameworkRule],
    files: &[FileContext],
    dependencies: &[DependencyInfo],
) -> Vec<FrameworkInfo> {
    let mut detected = Vec::new();

    for rule in rules {
        let mut evidence = Vec::new();

        for dep in dependencies {
            if rule
                .dependency_indicators
                .iter()
                .any(|ind| dependency_matches(&dep.name, ind))
            {
                evidence.push(format!("dependency {}", dep.name));
            }
        }

        for file in files {
            let imported = file.result.imports.iter().any(|imp| {
                rule.import_indicators
                    .iter()
                    .any(|ind| import_matches(&imp.module, ind))
            });
            if imported {
                evidence.push(format!("imported in {}", file.source.path));
            }
        }

        if !evidence.is_empty() {
            detected.push(FrameworkInfo {
                name: rule.name.to_string(),
                confidence: (0.4 * evidence.len() as f64).min(1.0),
                evidence,
            });
        }
    }

    detected.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    detected
}
