//! Bounded worker pool for parallel parsing.
//!
//! Parsing is CPU-bound, so each task runs under `spawn_blocking` with a
//! semaphore capping concurrency. A panicking or timed-out task fails for
//! its own path only; the batch always yields exactly one result per
//! submitted task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::types::{Language, ParseResult};

/// One unit of work: a file's content to parse.
#[derive(Debug, Clone)]
pub struct ParseTask {
    pub path: String,
    pub content: String,
    pub language: Language,
}

/// Per-task outcome. `Err` carries a human-readable failure reason.
#[derive(Debug)]
pub struct WorkerResult {
    pub path: String,
    pub outcome: Result<ParseResult, String>,
}

/// The function a pool runs per task. Injected so tests can simulate
/// panics and slow workers.
pub type WorkerFn = Arc<dyn Fn(&ParseTask) -> ParseResult + Send + Sync>;

pub struct WorkerPool {
    max_workers: usize,
    task_timeout: Duration,
}

impl WorkerPool {
    pub fn new(max_workers: usize, task_timeout_ms: u64) -> Self {
        Self {
            max_workers: max_workers.max(1),
            task_timeout: Duration::from_millis(task_timeout_ms),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run a batch to completion. Results are sorted by path for
    /// deterministic downstream folding.
    pub async fn run_batch(&self, tasks: Vec<ParseTask>, worker: WorkerFn) -> Vec<WorkerResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut join_set = JoinSet::new();
        let mut results = Vec::with_capacity(tasks.len());

        for task in tasks {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    results.push(WorkerResult {
                        path: task.path,
                        outcome: Err("worker pool closed".to_string()),
                    });
                    continue;
                }
            };
            let worker = Arc::clone(&worker);
            let timeout = self.task_timeout;

            join_set.spawn(async move {
                let _permit = permit;
                let path = task.path.clone();
                let handle = tokio::task::spawn_blocking(move || worker(&task));
                let outcome = match tokio::time::timeout(timeout, handle).await {
                    Ok(Ok(result)) => Ok(result),
                    Ok(Err(join_err)) => {
                        tracing::warn!(path = %path, "parse task panicked");
                        Err(format!("parse task panicked: {}", join_err))
                    }
                    Err(_) => {
                        tracing::warn!(path = %path, timeout_ms = timeout.as_millis() as u64, "parse task timed out");
                        Err(format!("parse task timed out after {:?}", timeout))
                    }
                };
                WorkerResult { path, outcome }
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                // The wrapper task itself never panics; a join error here
                // means the runtime is shutting down.
                Err(e) => tracing::error!("worker join failed: {}", e),
            }
        }

        results.sort_by(|a, b| a.path.cmp(&b.path));
        results
    }
}
