//! File discovery and batched reading.
//!
//! Discovery walks the tree once, cheaply: it looks only at names, sizes and
//! extensions, never file content. Content is read batch by batch so peak
//! memory tracks the batch size rather than the codebase size.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::cache::content_hash;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::lang::Router;
use crate::types::{Language, SourceFile};

/// A file found during discovery. Content has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path relative to the scan root.
    pub path: String,
    pub language: Language,
    pub size: u64,
}

/// Counters from one discovery walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryStats {
    /// Files skipped because no adapter claims their extension.
    pub unsupported: u64,
    /// Whether the max_files cap cut the walk short.
    pub truncated: bool,
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| ScanError::Config(format!("bad exclude pattern {:?}: {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ScanError::Config(format!("bad exclude set: {}", e)))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
}

/// Walk the root and collect every supported source file, in sorted order.
///
/// Hidden entries and excluded names are pruned before descent, so excluded
/// trees are never opened. Stops at `config.max_files` accepted files.
pub fn discover(
    root: &Path,
    router: &Router,
    config: &ScanConfig,
) -> Result<(Vec<DiscoveredFile>, DiscoveryStats), ScanError> {
    if !root.is_dir() {
        return Err(ScanError::InvalidRoot(root.to_path_buf()));
    }
    let excludes = build_exclude_set(&config.exclude_dirs)?;

    let mut files = Vec::new();
    let mut stats = DiscoveryStats::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if is_hidden(e) {
                return false;
            }
            !(e.depth() > 0 && excludes.is_match(e.file_name()))
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(root) {
            Ok(p) => p.to_string_lossy().to_string(),
            Err(_) => continue,
        };
        let language = match router.route(&relative) {
            Some(adapter) => adapter.language(),
            None => {
                stats.unsupported += 1;
                continue;
            }
        };
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

        if files.len() >= config.max_files {
            stats.truncated = true;
            tracing::warn!(max_files = config.max_files, "file cap reached, scan truncated");
            break;
        }
        files.push(DiscoveredFile {
            path: relative,
            language,
            size,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok((files, stats))
}

/// Cursor over discovered files, handing out batches of a caller-chosen
/// size. The size can vary between calls, which is how the scan loop
/// shrinks batches under memory pressure.
pub struct FileBatches {
    files: Vec<DiscoveredFile>,
    cursor: usize,
}

impl FileBatches {
    pub fn new(files: Vec<DiscoveredFile>) -> Self {
        Self { files, cursor: 0 }
    }

    pub fn next_batch(&mut self, size: usize) -> Option<Vec<DiscoveredFile>> {
        if self.cursor >= self.files.len() {
            return None;
        }
        let end = (self.cursor + size.max(1)).min(self.files.len());
        let batch = self.files[self.cursor..end].to_vec();
        self.cursor = end;
        Some(batch)
    }

    /// Rewind to the beginning for a fresh pass.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn remaining(&self) -> usize {
        self.files.len() - self.cursor
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }
}

/// Read a batch's content. Files that vanished or cannot be decoded are
/// skipped with a warning; a scan never fails on one bad file.
pub fn read_batch(root: &Path, batch: &[DiscoveredFile]) -> Vec<(SourceFile, String)> {
    let mut out = Vec::with_capacity(batch.len());
    for file in batch {
        let absolute = root.join(&file.path);
        let content = match std::fs::read_to_string(&absolute) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %file.path, "skipping unreadable file: {}", e);
                continue;
            }
        };
        let source = SourceFile {
            path: file.path.clone(),
            language: file.language,
            size: content.len() as u64,
            hash: content_hash(&content),
        };
        out.push((source, content));
    }
    out
}

/// Rough in-memory cost of holding a batch's content plus its trees.
pub fn estimate_memory_usage(batch: &[DiscoveredFile]) -> u64 {
    // Trees and result structs cost a small multiple of source size.
    batch.iter().map(|f| f.size).sum::<u64>().saturating_mul(3)
}

/// Pick the first batch size. Starts from the configured size and halves it
/// until the estimated cost of that many files from the front of the list
/// fits the budget. A zero budget means the limit is unknown and the
/// configured size stands.
pub fn initial_batch_size(files: &[DiscoveredFile], configured: usize, budget_bytes: u64) -> usize {
    let mut size = configured.max(1);
    if budget_bytes == 0 {
        return size;
    }
    while size > 1 && estimate_memory_usage(&files[..size.min(files.len())]) > budget_bytes {
        size /= 2;
    }
    size
}
