//! Process memory monitoring.
//!
//! Samples resident memory between batches and advises the scan loop when
//! usage crosses the configured fraction of total memory. Advisory only;
//! nothing here aborts a scan.

use std::collections::VecDeque;
use std::time::Instant;

use sysinfo::{get_current_pid, Pid, ProcessesToUpdate, System};

use crate::cache::{ParseCache, TreeCache};

/// Samples kept for the growth-rate window.
const MAX_SAMPLES: usize = 32;

/// A point-in-time view of process memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryStats {
    /// Resident memory of this process, bytes.
    pub used_bytes: u64,
    /// Total memory of the machine, bytes.
    pub limit_bytes: u64,
    /// Recent growth in bytes per second (negative when shrinking).
    pub growth_rate: f64,
}

/// What a pressure cleanup evicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupResult {
    pub parse_evicted: usize,
    pub tree_evicted: usize,
}

pub struct MemoryMonitor {
    system: System,
    pid: Option<Pid>,
    threshold: f64,
    samples: VecDeque<(Instant, u64)>,
}

impl MemoryMonitor {
    pub fn new(threshold: f64) -> Self {
        let pid = match get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("cannot resolve own pid, memory monitoring disabled: {}", e);
                None
            }
        };
        Self {
            system: System::new_all(),
            pid,
            threshold,
            samples: VecDeque::with_capacity(MAX_SAMPLES),
        }
    }

    /// Take a fresh sample and fold it into the growth window.
    pub fn sample(&mut self) -> MemoryStats {
        self.system.refresh_memory();
        let limit_bytes = self.system.total_memory();

        let used_bytes = match self.pid {
            Some(pid) => {
                self.system
                    .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                self.system
                    .process(pid)
                    .map(|p| p.memory())
                    .unwrap_or_default()
            }
            None => 0,
        };

        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back((Instant::now(), used_bytes));

        MemoryStats {
            used_bytes,
            limit_bytes,
            growth_rate: self.growth_rate(),
        }
    }

    fn growth_rate(&self) -> f64 {
        let (first, last) = match (self.samples.front(), self.samples.back()) {
            (Some(f), Some(l)) if f.0 != l.0 => (f, l),
            _ => return 0.0,
        };
        let elapsed = last.0.duration_since(first.0).as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        (last.1 as f64 - first.1 as f64) / elapsed
    }

    /// Whether the given sample crosses the pressure threshold.
    pub fn under_pressure(&self, stats: &MemoryStats) -> bool {
        if stats.limit_bytes == 0 {
            return false;
        }
        stats.used_bytes as f64 > self.threshold * stats.limit_bytes as f64
    }

    /// Shed roughly half of each cache. Correctness is unaffected since
    /// evicted entries simply reparse on next access.
    pub fn cleanup(&self, parse: &mut ParseCache, trees: &mut TreeCache) -> CleanupResult {
        let parse_evicted = parse.prune_oldest((parse.len() / 2).max(1));
        let tree_evicted = trees.evict_oldest((trees.len() / 2).max(1));
        tracing::info!(parse_evicted, tree_evicted, "memory pressure cleanup");
        CleanupResult {
            parse_evicted,
            tree_evicted,
        }
    }
}
