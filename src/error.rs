//! Fatal error type for codebase analysis.
//!
//! Only configuration problems are fatal; per-file failures are reported as
//! diagnostics or failed worker results and never abort a scan.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced before or at scan construction.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("root path {0:?} does not exist or is not a directory")]
    InvalidRoot(PathBuf),

    #[error("no language adapters registered")]
    NoAdapters,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
