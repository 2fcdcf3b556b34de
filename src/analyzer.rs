//! Scan orchestration.
//!
//! `CodebaseAnalyzer` wires discovery, routing, the caches, the worker pool
//! and aggregation into one scan loop. Caches and the memory monitor are
//! mutated only here, between batches; workers receive owned task data and
//! return plain results.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::aggregate::{manifest, Aggregator, CodebaseContext};
use crate::cache::{content_hash, ParseCache, ParseKey, TreeCache};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::incremental;
use crate::lang::Router;
use crate::memory::MemoryMonitor;
use crate::pool::{ParseTask, WorkerFn, WorkerPool};
use crate::stream::{self, FileBatches};
use crate::types::{Diagnostic, ParseResult};

/// Counters for one scan run.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ScanSummary {
    /// Files that produced a result (including failed ones, which carry a
    /// diagnostic).
    pub scanned: usize,
    /// Files whose parse task panicked or timed out.
    pub failed: usize,
    /// Files skipped because no adapter claims their extension.
    pub unsupported: u64,
    /// Parse-cache hits during this scan run.
    pub cache_hits: u64,
    /// Parse-cache misses during this scan run.
    pub cache_misses: u64,
    /// Whether the scan stopped early on request.
    pub cancelled: bool,
    /// Whether the max_files cap cut discovery short.
    pub truncated: bool,
    pub duration_ms: u64,
}

/// A finished scan: the aggregated context plus run counters.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanReport {
    pub context: CodebaseContext,
    pub summary: ScanSummary,
}

/// Outcome of an incremental single-file update.
#[derive(Debug, Clone)]
pub struct FileUpdate {
    pub result: ParseResult,
    /// False when the new result carries the same facts as the previous
    /// one, in which case the aggregate does not need re-folding.
    pub needs_refold: bool,
}

pub struct CodebaseAnalyzer {
    root: PathBuf,
    config: ScanConfig,
    router: Arc<Router>,
    parse_cache: ParseCache,
    tree_cache: TreeCache,
    monitor: MemoryMonitor,
    pool: WorkerPool,
    cancel: Arc<AtomicBool>,
}

impl std::fmt::Debug for CodebaseAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodebaseAnalyzer")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CodebaseAnalyzer {
    pub fn new(root: PathBuf, config: ScanConfig) -> Result<Self, ScanError> {
        Self::with_router(root, config, Arc::new(Router::with_default_adapters()))
    }

    pub fn with_router(
        root: PathBuf,
        config: ScanConfig,
        router: Arc<Router>,
    ) -> Result<Self, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::InvalidRoot(root));
        }
        if router.is_empty() {
            return Err(ScanError::NoAdapters);
        }
        config.validate()?;

        Ok(Self {
            parse_cache: ParseCache::new(config.parse_cache_capacity),
            tree_cache: TreeCache::new(config.tree_cache_capacity),
            monitor: MemoryMonitor::new(config.memory_threshold),
            pool: WorkerPool::new(config.max_workers, config.task_timeout_ms),
            cancel: Arc::new(AtomicBool::new(false)),
            root,
            config,
            router,
        })
    }

    /// Handle for requesting cancellation from another task or a signal
    /// handler. The scan stops at the next batch boundary.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn worker(&self) -> WorkerFn {
        let router = Arc::clone(&self.router);
        Arc::new(move |task: &ParseTask| match router.adapter_for(task.language) {
            Some(adapter) => adapter.parse_file(&task.content, &task.path),
            None => {
                let mut result = ParseResult::empty(task.language);
                result
                    .diagnostics
                    .push(Diagnostic::new("no adapter for language", None));
                result
            }
        })
    }

    /// Scan the root and aggregate every supported file.
    ///
    /// Per-file problems (unreadable, malformed, panicking, slow) never fail
    /// the scan; they surface as diagnostics and summary counters.
    pub async fn scan(&mut self) -> Result<ScanReport, ScanError> {
        let started = Instant::now();
        tracing::debug!(extensions = ?self.router.extensions(), "scan starting");
        let (files, discovery) = stream::discover(&self.root, &self.router, &self.config)?;
        tracing::info!(
            files = files.len(),
            unsupported = discovery.unsupported,
            "discovery complete"
        );

        let cache_before = self.parse_cache.stats();
        let baseline = self.monitor.sample();
        // First batch sized so the estimated content cost stays within a
        // quarter of machine memory.
        let mut batch_size =
            stream::initial_batch_size(&files, self.config.batch_size, baseline.limit_bytes / 4);
        tracing::debug!(batch_size, "initial batch size");

        let mut batches = FileBatches::new(files);
        let mut aggregator = Aggregator::new();
        let mut workers = self.config.max_workers;
        let worker = self.worker();
        let mut failed = 0usize;
        let mut cancelled = false;

        while let Some(batch) = batches.next_batch(batch_size) {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::info!(remaining = batches.remaining() + batch.len(), "scan cancelled");
                cancelled = true;
                break;
            }

            tracing::debug!(
                files = batch.len(),
                estimated_bytes = stream::estimate_memory_usage(&batch),
                "processing batch"
            );
            let read = stream::read_batch(&self.root, &batch);

            let mut tasks = Vec::new();
            let mut pending = std::collections::HashMap::new();
            for (source, content) in read {
                let key = ParseKey::new(source.path.clone(), source.hash.clone());
                if let Some(result) = self.parse_cache.get(&key) {
                    aggregator.fold(source, result);
                } else {
                    tasks.push(ParseTask {
                        path: source.path.clone(),
                        content,
                        language: source.language,
                    });
                    pending.insert(source.path.clone(), source);
                }
            }

            for outcome in self.pool.run_batch(tasks, Arc::clone(&worker)).await {
                let source = match pending.remove(&outcome.path) {
                    Some(s) => s,
                    None => continue,
                };
                let result = match outcome.outcome {
                    Ok(result) => {
                        self.parse_cache.set(
                            ParseKey::new(source.path.clone(), source.hash.clone()),
                            result.clone(),
                        );
                        result
                    }
                    Err(reason) => {
                        failed += 1;
                        let mut result = ParseResult::empty(source.language);
                        result.diagnostics.push(Diagnostic::new(reason, None));
                        result
                    }
                };
                aggregator.fold(source, result);
            }

            let stats = self.monitor.sample();
            if self.monitor.under_pressure(&stats) {
                self.monitor
                    .cleanup(&mut self.parse_cache, &mut self.tree_cache);
                batch_size = (batch_size / 2).max(1);
                workers = (workers / 2).max(1);
                self.pool = WorkerPool::new(workers, self.config.task_timeout_ms);
                tracing::info!(batch_size, workers, "memory pressure, throttling scan");
            }
        }

        aggregator.set_dependencies(manifest::collect_dependencies(&self.root));
        let rules = self.router.framework_rules();
        let context = aggregator.finish(&rules);
        let cache = self.parse_cache.stats();

        Ok(ScanReport {
            summary: ScanSummary {
                scanned: context.files.len(),
                failed,
                unsupported: discovery.unsupported,
                cache_hits: cache.hits - cache_before.hits,
                cache_misses: cache.misses - cache_before.misses,
                cancelled,
                truncated: discovery.truncated,
                duration_ms: started.elapsed().as_millis() as u64,
            },
            context,
        })
    }

    /// Reparse one edited file incrementally.
    ///
    /// Returns `None` for unsupported paths. `needs_refold` tells the caller
    /// whether the new result changes any extracted facts.
    pub fn update_file(&mut self, path: &str, old_text: &str, new_text: &str) -> Option<FileUpdate> {
        let adapter = Arc::clone(self.router.route(path)?);

        let previous = self
            .parse_cache
            .get(&ParseKey::new(path, content_hash(old_text)));

        let result =
            incremental::reparse(adapter.as_ref(), &mut self.tree_cache, path, old_text, new_text);
        self.parse_cache
            .set(ParseKey::new(path, content_hash(new_text)), result.clone());

        let needs_refold = previous.map(|p| !p.same_facts(&result)).unwrap_or(true);
        Some(FileUpdate {
            result,
            needs_refold,
        })
    }

    /// Forget a deleted file: drop every cached result for the path and its
    /// tree. Returns whether anything was cached for it.
    pub fn remove_file(&mut self, path: &str) -> bool {
        let results = self.parse_cache.invalidate(path);
        let tree = self.tree_cache.remove(path);
        results > 0 || tree
    }

    /// Release parser engines and drop all cached state.
    pub fn dispose(&mut self) {
        self.router.dispose_all();
        self.parse_cache.clear();
        self.tree_cache.clear();
    }
}
