use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::progress::ProgressObserver;
use super::{DerivativeOutcome, FileOutcome};

/// Batch processing statistics and progress tracking
pub struct BatchProcessor {
    pub total_files: usize,
    pub processed_count: AtomicUsize,
    pub start_time: Instant,
}

impl BatchProcessor {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            processed_count: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Increment processed count and return current count
    pub fn increment(&self) -> usize {
        self.processed_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_files == 0 {
            1.0
        } else {
            (self.processed_count.load(Ordering::Relaxed) as f64) / (self.total_files as f64)
        }
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Option<Duration> {
        let processed = self.processed_count.load(Ordering::Relaxed);
        if processed == 0 {
            return None;
        }

        let elapsed = self.start_time.elapsed();
        let remaining = self.total_files.saturating_sub(processed);

        if remaining == 0 {
            return Some(Duration::new(0, 0));
        }

        let time_per_item = elapsed / processed as u32;
        Some(time_per_item * remaining as u32)
    }

    /// Tally per-file outcomes into the batch summary
    pub fn summarize(&self, outcomes: &[&FileOutcome], warnings: usize) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.total_files,
            warnings,
            duration: self.start_time.elapsed(),
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome {
                FileOutcome::Completed(report) => {
                    summary.completed += 1;
                    for derivative in &report.derivatives {
                        match derivative.outcome {
                            DerivativeOutcome::Written(_) => summary.derivatives_written += 1,
                            DerivativeOutcome::WouldWrite(_) => summary.derivatives_planned += 1,
                            DerivativeOutcome::Skipped(_) => summary.derivatives_skipped += 1,
                        }
                    }
                }
                FileOutcome::Skipped(_) => summary.skipped += 1,
                FileOutcome::Failed(_) => summary.failed += 1,
                FileOutcome::Cancelled => summary.cancelled += 1,
            }
        }

        summary
    }
}

/// Final tally of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub derivatives_written: usize,
    /// Derivatives a dry run would have written
    pub derivatives_planned: usize,
    pub derivatives_skipped: usize,
    pub warnings: usize,
    pub duration: Duration,
}

impl BatchSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn has_problems(&self) -> bool {
        self.failed > 0 || self.skipped > 0 || self.derivatives_skipped > 0
    }
}

/// Observer wrapper that forwards everything and counts warnings
pub struct CountingObserver<'a> {
    inner: &'a dyn ProgressObserver,
    warnings: AtomicUsize,
}

impl<'a> CountingObserver<'a> {
    pub fn new(inner: &'a dyn ProgressObserver) -> Self {
        Self {
            inner,
            warnings: AtomicUsize::new(0),
        }
    }

    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for CountingObserver<'_> {
    fn current_file(&self, name: &str) {
        self.inner.current_file(name);
    }

    fn status(&self, message: &str) {
        self.inner.status(message);
    }

    fn image_progress(&self, percent: u8) {
        self.inner.image_progress(percent);
    }

    fn warning(&self, message: &str) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        self.inner.warning(message);
    }

    fn file_finished(&self, input: &Path, outcome: &FileOutcome) {
        self.inner.file_finished(input, outcome);
    }
}
