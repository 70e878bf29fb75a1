use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Per-source item counters with periodic progress lines and a final summary.
/// Small batches stay quiet until the summary.
pub struct ProgressTracker {
    source: String,
    total: usize,
    created: usize,
    updated: usize,
    locked: usize,
    failed: usize,
    start_time: Instant,
    progress_interval: usize,
    last_progress_log: usize,
    error_counts: HashMap<&'static str, usize>,
}

impl ProgressTracker {
    pub fn new(source: &str, total: usize, progress_interval: usize) -> Self {
        if total > 10 {
            info!(operation = "sync_source", source = %source, total, "Starting item sync");
        }
        Self {
            source: source.to_string(),
            total,
            created: 0,
            updated: 0,
            locked: 0,
            failed: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn record_created(&mut self) {
        self.created += 1;
    }

    pub fn record_updated(&mut self) {
        self.updated += 1;
    }

    pub fn record_locked(&mut self) {
        self.locked += 1;
    }

    /// Count a failure under a coarse category such as "fetch" or "store"
    pub fn record_failed(&mut self, category: &'static str) {
        self.failed += 1;
        *self.error_counts.entry(category).or_insert(0) += 1;
    }

    /// `current` is 1-based
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log < self.progress_interval || current == self.total {
            return;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { current as f64 / elapsed } else { 0.0 };
        info!(
            "Progress: {}/{} ({:.1} items/sec) | Created: {} | Updated: {} | Locked: {} | Failed: {}",
            current, self.total, rate, self.created, self.updated, self.locked, self.failed
        );
        self.last_progress_log = current;
    }

    pub fn log_summary(&self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.failed > 0 {
            let mut breakdown: Vec<_> = self.error_counts.iter().collect();
            breakdown.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            let breakdown: Vec<String> = breakdown
                .iter()
                .map(|(category, count)| format!("{}: {}", category, count))
                .collect();
            warn!(
                "{} completed: {} items in {:.1}s | Created: {} | Updated: {} | Locked: {} | Failed: {} ({})",
                self.source,
                self.total,
                elapsed,
                self.created,
                self.updated,
                self.locked,
                self.failed,
                breakdown.join(", ")
            );
        } else {
            info!(
                "{} completed: {} items in {:.1}s | Created: {} | Updated: {} | Locked: {}",
                self.source, self.total, elapsed, self.created, self.updated, self.locked
            );
        }
    }
}
