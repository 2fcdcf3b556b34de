//! Stackscout - codebase structure analysis.
//!
//! Stackscout scans a codebase, parses every supported source file with
//! tree-sitter and aggregates what it finds: imports, exports, functions,
//! frameworks and declared dependencies. Five language families are
//! supported out of the box: TypeScript/JavaScript, Python, Go, Rust and
//! Java.
//!
//! # Architecture
//!
//! - `lang`: language adapters and extension-based routing
//! - `stream`: file discovery and batched reading
//! - `pool`: bounded worker pool for parallel parsing
//! - `cache`: content-addressed caches for results and parse trees
//! - `incremental`: edit calculation and tree-reusing reparse
//! - `memory`: process memory sampling and pressure response
//! - `aggregate`: codebase-wide context and framework detection
//! - `analyzer`: the scan loop tying the above together
//! - `report`: output formatting (pretty, JSON)
//!
//! # Adding a New Language
//!
//! See `src/lang/` for examples. Implement the `Adapter` trait and register
//! it in `Router::with_default_adapters`.

pub mod aggregate;
pub mod analyzer;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod incremental;
pub mod lang;
pub mod memory;
pub mod pool;
pub mod report;
pub mod stream;
pub mod types;

pub use aggregate::{Aggregator, CodebaseContext, FileContext};
pub use analyzer::{CodebaseAnalyzer, FileUpdate, ScanReport, ScanSummary};
pub use config::ScanConfig;
pub use error::ScanError;
pub use lang::{Adapter, Router};
pub use types::{
    DependencyInfo, Diagnostic, ExportInfo, ExportKind, FrameworkInfo, FrameworkRule,
    FunctionInfo, ImportInfo, Language, ParseResult, SourceFile,
};
