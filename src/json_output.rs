//! JSON output for front-end integration
//!
//! When --json-progress flag is enabled, all progress and status information
//! is emitted as JSON lines to stdout, suppressing all other output.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::image_processing::batch::BatchSummary;
use crate::image_processing::progress::ProgressObserver;
use crate::image_processing::{DerivativeOutcome, FileOutcome, FileReport};

/// Last progress emission timestamp (milliseconds since epoch)
/// Used for throttling per-image progress to ~25 FPS (40ms between updates)
static LAST_PROGRESS_MS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    /// Batch status line
    Status { message: String },
    /// Per-image progress in percent
    Progress { percent: u8 },
    /// A file is about to be processed
    CurrentFile { name: String },
    /// Non-fatal problem the operator should look at
    Warning { message: String },
    /// File processing completed
    FileCompleted {
        input_path: String,
        output_paths: Vec<String>,
        skipped: usize,
    },
    /// File processing failed or was skipped as a whole
    FileFailed { input_path: String, error: String },
    /// Processing summary
    Summary {
        total_files: usize,
        completed: usize,
        skipped: usize,
        failed: usize,
        cancelled: usize,
        derivatives_written: usize,
        warnings: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    /// Create and emit progress message (throttled to ~25 FPS)
    ///
    /// The final progress (100%) is always emitted to ensure completion is visible.
    pub fn progress(percent: u8) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let last_ms = LAST_PROGRESS_MS.load(Ordering::Relaxed);

        if now_ms.saturating_sub(last_ms) >= 40 || percent >= 100 {
            LAST_PROGRESS_MS.store(now_ms, Ordering::Relaxed);
            Self::Progress { percent }.emit();
        }
    }

    /// Build the completion message for one file report
    pub fn file_completed(report: &FileReport) -> Self {
        let output_paths = report
            .derivatives
            .iter()
            .filter_map(|d| match &d.outcome {
                DerivativeOutcome::Written(path) | DerivativeOutcome::WouldWrite(path) => {
                    Some(path.display().to_string())
                }
                DerivativeOutcome::Skipped(_) => None,
            })
            .collect();

        Self::FileCompleted {
            input_path: report.input_path.display().to_string(),
            output_paths,
            skipped: report.skipped_count(),
        }
    }

    pub fn file_failed(input_path: &Path, error: impl Into<String>) -> Self {
        Self::FileFailed {
            input_path: input_path.display().to_string(),
            error: error.into(),
        }
    }

    pub fn summary(summary: &BatchSummary) -> Self {
        Self::Summary {
            total_files: summary.total,
            completed: summary.completed,
            skipped: summary.skipped,
            failed: summary.failed,
            cancelled: summary.cancelled,
            derivatives_written: summary.derivatives_written,
            warnings: summary.warnings,
            duration_secs: summary.duration.as_secs_f64(),
        }
    }
}

/// Observer that reports every notification as a JSON line
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonObserver;

impl ProgressObserver for JsonObserver {
    fn current_file(&self, name: &str) {
        JsonMessage::CurrentFile {
            name: name.to_string(),
        }
        .emit();
    }

    fn status(&self, message: &str) {
        JsonMessage::Status {
            message: message.to_string(),
        }
        .emit();
    }

    fn image_progress(&self, percent: u8) {
        JsonMessage::progress(percent);
    }

    fn warning(&self, message: &str) {
        JsonMessage::Warning {
            message: message.to_string(),
        }
        .emit();
    }

    fn file_finished(&self, input: &Path, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Completed(report) => JsonMessage::file_completed(report).emit(),
            FileOutcome::Skipped(reason) => JsonMessage::file_failed(input, reason.to_string()).emit(),
            FileOutcome::Failed(error) => JsonMessage::file_failed(input, error.as_str()).emit(),
            FileOutcome::Cancelled => JsonMessage::file_failed(input, "cancelled").emit(),
        }
    }
}
