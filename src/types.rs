//! Core types shared across the analysis pipeline.

use serde::{Deserialize, Serialize};

/// The five supported language families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    Python,
    Go,
    Rust,
    Java,
}

impl Language {
    /// String identifier used in reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
        }
    }

    /// Map a file extension (without dot) to a language family.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "tsx" | "js" | "jsx" => Some(Language::TypeScript),
            "py" => Some(Language::Python),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            "java" => Some(Language::Java),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discovered source file. Immutable; a re-scan produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the scan root (stable identifier).
    pub path: String,
    /// Detected language family.
    pub language: Language,
    /// File size in bytes.
    pub size: u64,
    /// SHA-256 hex digest of the content.
    pub hash: String,
}

/// A single import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    /// The imported module or package path.
    pub module: String,
    /// Names brought into scope (empty for bare imports).
    pub imported_names: Vec<String>,
    /// Whether this is a default import (JS/TS).
    pub is_default: bool,
    /// Line number (1-indexed).
    pub line: usize,
}

/// Kind of exported symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Function,
    Class,
    Const,
    Type,
    Default,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Function => "function",
            ExportKind::Class => "class",
            ExportKind::Const => "const",
            ExportKind::Type => "type",
            ExportKind::Default => "default",
        }
    }
}

/// A single exported symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    pub name: String,
    pub kind: ExportKind,
    /// Line number (1-indexed).
    pub line: usize,
}

/// A function or method found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub param_count: usize,
    pub is_async: bool,
    pub is_exported: bool,
    /// First line of the declaration (1-indexed).
    pub start_line: usize,
    /// Last line of the declaration (1-indexed).
    pub end_line: usize,
}

/// A non-fatal problem encountered while parsing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    /// Line number (1-indexed) when the location is known.
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// Uniform extraction result for one file.
///
/// Always valid: malformed input yields empty lists plus diagnostics,
/// never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub language: Language,
    pub imports: Vec<ImportInfo>,
    pub exports: Vec<ExportInfo>,
    pub functions: Vec<FunctionInfo>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// An empty-but-valid result for a language.
    pub fn empty(language: Language) -> Self {
        Self {
            language,
            imports: Vec::new(),
            exports: Vec::new(),
            functions: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Sort imports/exports/functions by position for deterministic output.
    pub fn normalize(&mut self) {
        self.imports.sort_by(|a, b| (a.line, &a.module).cmp(&(b.line, &b.module)));
        self.exports.sort_by(|a, b| (a.line, &a.name).cmp(&(b.line, &b.name)));
        self.functions
            .sort_by(|a, b| (a.start_line, &a.name).cmp(&(b.start_line, &b.name)));
    }

    /// Equality ignoring diagnostic ordering, used by the incremental path
    /// to decide whether the aggregate needs re-folding.
    pub fn same_facts(&self, other: &ParseResult) -> bool {
        self.language == other.language
            && self.imports == other.imports
            && self.exports == other.exports
            && self.functions == other.functions
    }
}

/// Static detection signature for a framework or major library.
#[derive(Debug, Clone, Copy)]
pub struct FrameworkRule {
    pub name: &'static str,
    /// Manifest dependency names that indicate this framework.
    pub dependency_indicators: &'static [&'static str],
    /// Import module names/prefixes that indicate this framework.
    pub import_indicators: &'static [&'static str],
}

/// A detected framework with supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkInfo {
    pub name: String,
    /// Confidence in [0, 1], monotonic in evidence count.
    pub confidence: f64,
    pub evidence: Vec<String>,
}

/// A dependency declared in a manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub name: String,
    pub version: Option<String>,
}
