use std::path::Path;

use super::FileOutcome;

/// Receiver for batch progress notifications
///
/// Delivery is fire-and-forget: processing never depends on what an observer does with a
/// message. Implementations must be thread-safe because files may be processed in parallel.
pub trait ProgressObserver: Send + Sync {
    /// A file is about to be processed
    fn current_file(&self, name: &str);

    /// Batch-level status line, e.g. `(3/10) Processing image...`
    fn status(&self, message: &str);

    /// Per-image progress in percent (25/50/75/100 as presets finish)
    fn image_progress(&self, _percent: u8) {}

    /// Something the operator should look at; processing continues
    fn warning(&self, message: &str);

    /// A file has been processed, skipped, failed or cancelled
    fn file_finished(&self, _input: &Path, _outcome: &FileOutcome) {}
}

/// Observer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn current_file(&self, _name: &str) {}
    fn status(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
}

/// Status line reported after file `index` (0-based) of `total`
pub fn processing_status(index: usize, total: usize) -> String {
    format!("({}/{}) Processing image...", index + 1, total)
}

/// Terminal status line of a batch
pub fn completion_status(total: usize) -> String {
    format!("Processing complete! ({} images processed)", total)
}

/// Warning shown when a derivative needs a manual crop
pub fn no_face_warning(output_name: &str) -> String {
    format!(
        "No face detected. Please crop this {} image manually. Thank you!.",
        output_name
    )
}
