//! Scan configuration.
//!
//! Configuration can come from a `stackscout.yaml` file, from CLI flags, or
//! from the defaults below. The file format mirrors the struct field names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ScanError;

/// Default config file names to search for.
const DEFAULT_CONFIG_NAMES: &[&str] = &["stackscout.yaml", ".stackscout.yaml"];

/// Directories skipped during discovery, before any file is read.
fn default_exclude_dirs() -> Vec<String> {
    [
        "node_modules",
        "vendor",
        "target",
        "dist",
        "build",
        "__pycache__",
        ".venv",
        "venv",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_files() -> usize {
    50_000
}

fn default_batch_size() -> usize {
    64
}

fn default_max_workers() -> usize {
    num_cpus::get().max(1)
}

fn default_task_timeout_ms() -> u64 {
    10_000
}

fn default_parse_cache_capacity() -> usize {
    4096
}

fn default_tree_cache_capacity() -> usize {
    512
}

fn default_memory_threshold() -> f64 {
    0.8
}

/// Tunable parameters for a codebase scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Hard cap on the number of files discovered.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Directory names excluded from discovery (hidden dirs always skipped).
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Files read and parsed per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Parallel parse tasks in flight.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-task timeout; a task exceeding it fails for its path only.
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,

    /// LRU capacity of the parse-result cache (entries).
    #[serde(default = "default_parse_cache_capacity")]
    pub parse_cache_capacity: usize,

    /// Capacity of the parse-tree cache (one entry per tracked path).
    #[serde(default = "default_tree_cache_capacity")]
    pub tree_cache_capacity: usize,

    /// Fraction of total memory above which the scan loop shrinks batch and
    /// worker counts and prunes caches. Advisory only.
    #[serde(default = "default_memory_threshold")]
    pub memory_threshold: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            exclude_dirs: default_exclude_dirs(),
            batch_size: default_batch_size(),
            max_workers: default_max_workers(),
            task_timeout_ms: default_task_timeout_ms(),
            parse_cache_capacity: default_parse_cache_capacity(),
            tree_cache_capacity: default_tree_cache_capacity(),
            memory_threshold: default_memory_threshold(),
        }
    }
}

impl ScanConfig {
    /// Parse a config file (YAML).
    pub fn parse_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ScanConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Look for a config file in the current directory.
    pub fn discover() -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    /// Validate parameter ranges. Called once at analyzer construction.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.max_files == 0 {
            return Err(ScanError::Config("max_files must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(ScanError::Config("batch_size must be positive".into()));
        }
        if self.max_workers == 0 {
            return Err(ScanError::Config("max_workers must be positive".into()));
        }
        if self.parse_cache_capacity == 0 || self.tree_cache_capacity == 0 {
            return Err(ScanError::Config(
                "cache capacities must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.memory_threshold) {
            return Err(ScanError::Config(
                "memory_threshold must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}
