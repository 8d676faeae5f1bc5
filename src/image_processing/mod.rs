pub mod batch;
pub mod center;
pub mod crop;
pub mod encode;
pub mod face_detection;
pub mod pipeline;
pub mod presets;
pub mod progress;
pub mod report;
pub mod resize;
pub mod subject;

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::utils::{has_valid_extension, verbose_println};
use batch::{BatchProcessor, BatchSummary, CountingObserver};
use face_detection::FaceDetector;
use pipeline::{process_file, PipelineOptions};
use presets::{PresetKind, SizePreset, ALL_PRESETS, OUTPUT_FOLDER_NAME};
use progress::{completion_status, processing_status, ProgressObserver};
use subject::BoundingBox;

/// Status reported when discovery finds nothing to process
pub const NO_IMAGES_STATUS: &str = "No PNG images found in the selected folder.";

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Center on the largest detected face instead of the subject's middle
    pub detect_faces: bool,
    /// SeetaFace model used when `detect_faces` is set
    pub face_model: Option<PathBuf>,
    /// Root for per-image output folders; defaults to `Output/` next to each input
    pub output_root: Option<PathBuf>,
    pub extensions: Vec<String>,
    pub verbose: bool,
    pub parallel_jobs: usize,
    pub dry_run: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            detect_faces: true,
            face_model: None,
            output_root: None,
            extensions: vec!["png".to_string()],
            verbose: false,
            parallel_jobs: 1,
            dry_run: false,
        }
    }
}

/// Why a file or a single derivative was not produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoAlphaChannel,
    NoSubject,
    NoFace,
    CropFailed(String),
    CenterFailed(String),
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoAlphaChannel => write!(f, "no alpha channel"),
            SkipReason::NoSubject => write!(f, "no subject found"),
            SkipReason::NoFace => write!(f, "no face detected, crop manually"),
            SkipReason::CropFailed(e) => write!(f, "crop failed: {}", e),
            SkipReason::CenterFailed(e) => write!(f, "centering failed: {}", e),
            SkipReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DerivativeOutcome {
    Written(PathBuf),
    /// Dry run: the file would have been written here
    WouldWrite(PathBuf),
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
pub struct DerivativeReport {
    pub preset: PresetKind,
    pub output_path: PathBuf,
    pub outcome: DerivativeOutcome,
    pub clipped_columns: u32,
}

/// Result of running every preset over one source file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// Subject box on the bounded working image
    pub subject: BoundingBox,
    pub derivatives: Vec<DerivativeReport>,
}

impl FileReport {
    pub fn written_count(&self) -> usize {
        self.derivatives
            .iter()
            .filter(|d| matches!(d.outcome, DerivativeOutcome::Written(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.derivatives
            .iter()
            .filter(|d| matches!(d.outcome, DerivativeOutcome::Skipped(_)))
            .count()
    }
}

#[derive(Debug, Clone)]
pub enum FileOutcome {
    Completed(FileReport),
    /// The whole file was skipped before any derivative was attempted
    Skipped(SkipReason),
    Failed(String),
    Cancelled,
}

/// Outcome of a batch run, in input order
#[derive(Debug)]
pub struct BatchResult {
    pub outcomes: Vec<(PathBuf, FileOutcome)>,
    pub summary: BatchSummary,
}

pub struct ProcessingEngine {
    config: ProcessingConfig,
    presets: Vec<SizePreset>,
    detector: Option<Box<dyn FaceDetector>>,
    cancel: Arc<AtomicBool>,
}

impl ProcessingEngine {
    /// Build an engine, loading the face model when face detection is enabled
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        let detector = if config.detect_faces {
            Some(load_detector(config.face_model.as_deref())?)
        } else {
            None
        };

        Ok(Self {
            config,
            presets: ALL_PRESETS.to_vec(),
            detector,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build an engine around a caller-supplied detector backend
    pub fn with_detector(config: ProcessingConfig, detector: Box<dyn FaceDetector>) -> Self {
        Self {
            config,
            presets: ALL_PRESETS.to_vec(),
            detector: Some(detector),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Restrict the run to a subset of the fixed presets
    pub fn with_presets(mut self, presets: &[SizePreset]) -> Self {
        self.presets = presets.to_vec();
        self
    }

    pub fn presets(&self) -> &[SizePreset] {
        &self.presets
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Flag checked between files and between presets; set it to stop the batch early
    ///
    /// This is a hook for library callers (a GUI stop button, a signal handler). The CLI runs
    /// every batch to completion and never sets it.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Discover PNG files in the input directories (non-recursive) or accept files directly
    pub fn discover_images(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut image_files = Vec::new();

        for input in inputs {
            if input.is_file() {
                if has_valid_extension(input, &self.config.extensions) {
                    image_files.push(input.clone());
                }
                continue;
            }

            verbose_println(self.config.verbose, &format!("Scanning directory: {}", input.display()));

            let walker = WalkDir::new(input).follow_links(false).max_depth(1);
            for entry in walker {
                let entry = entry
                    .with_context(|| format!("Failed to read directory entry in {}", input.display()))?;
                let path = entry.path();

                if path.is_file() && has_valid_extension(path, &self.config.extensions) {
                    image_files.push(path.to_path_buf());
                }
            }
        }

        // Sort for consistent processing order
        image_files.sort();
        image_files.dedup();

        verbose_println(self.config.verbose, &format!("Found {} image files", image_files.len()));
        Ok(image_files)
    }

    /// Folder that receives the derivatives of `input_path`
    pub fn output_dir_for(&self, input_path: &Path) -> PathBuf {
        let root = match &self.config.output_root {
            Some(root) => root.clone(),
            None => input_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(OUTPUT_FOLDER_NAME),
        };
        let stem = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        root.join(stem)
    }

    /// Process one file, turning any error into a reported failure
    pub fn process_single_image(&self, input_path: &Path, observer: &dyn ProgressObserver) -> FileOutcome {
        if self.cancel.load(Ordering::Relaxed) {
            return FileOutcome::Cancelled;
        }

        verbose_println(self.config.verbose, &format!("Processing: {}", input_path.display()));

        let output_dir = self.output_dir_for(input_path);
        let detector = if self.config.detect_faces {
            self.detector.as_deref()
        } else {
            None
        };
        let options = PipelineOptions {
            presets: &self.presets,
            detector,
            dry_run: self.config.dry_run,
            cancel: &self.cancel,
        };

        let result = if self.config.dry_run {
            process_file(input_path, &output_dir, &options, observer)
        } else {
            // Created even when every derivative is skipped
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))
                .and_then(|_| process_file(input_path, &output_dir, &options, observer))
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                let name = input_path
                    .file_name()
                    .and_then(|f| f.to_str())
                    .unwrap_or("unknown");
                observer.warning(&format!("{}: processing failed: {:#}", name, e));
                FileOutcome::Failed(format!("{:#}", e))
            }
        }
    }

    /// Run the batch, isolating every per-file failure
    ///
    /// Files are processed one at a time unless `parallel_jobs` is above 1, in which case a
    /// dedicated rayon pool spreads them over that many workers. Presets within a file always
    /// run serially.
    pub fn process_batch(&self, image_files: &[PathBuf], observer: &dyn ProgressObserver) -> Result<BatchResult> {
        let counting = CountingObserver::new(observer);
        let processor = BatchProcessor::new(image_files.len());

        if image_files.is_empty() {
            counting.status(NO_IMAGES_STATUS);
            return Ok(BatchResult {
                outcomes: Vec::new(),
                summary: processor.summarize(&[], 0),
            });
        }

        let total = image_files.len();
        let processed_count = AtomicUsize::new(0);

        let run_one = |image_path: &PathBuf| {
            if let Some(name) = image_path.file_name().and_then(|f| f.to_str()) {
                counting.current_file(name);
            }

            let outcome = self.process_single_image(image_path, &counting);
            counting.file_finished(image_path, &outcome);

            let count = processed_count.fetch_add(1, Ordering::Relaxed);
            processor.increment();
            counting.status(&processing_status(count, total));

            (image_path.clone(), outcome)
        };

        let outcomes: Vec<(PathBuf, FileOutcome)> = if self.config.parallel_jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.parallel_jobs)
                .build()
                .context("Failed to initialize thread pool")?;
            pool.install(|| image_files.par_iter().map(run_one).collect())
        } else {
            image_files.iter().map(run_one).collect()
        };

        counting.status(&completion_status(total));

        let outcome_refs: Vec<&FileOutcome> = outcomes.iter().map(|(_, o)| o).collect();
        let summary = processor.summarize(&outcome_refs, counting.warnings());

        Ok(BatchResult { outcomes, summary })
    }
}

#[cfg(feature = "face-detection")]
fn load_detector(model: Option<&Path>) -> Result<Box<dyn FaceDetector>> {
    let model = model.ok_or_else(|| {
        anyhow::anyhow!("Face detection requires a SeetaFace model; pass --face-model <FILE> or --center-only")
    })?;
    Ok(Box::new(face_detection::RustfaceDetector::from_model_file(model)?))
}

#[cfg(not(feature = "face-detection"))]
fn load_detector(_model: Option<&Path>) -> Result<Box<dyn FaceDetector>> {
    Err(anyhow::anyhow!(
        "Face detection is not available. Rebuild with --features face-detection or pass --center-only"
    ))
}
