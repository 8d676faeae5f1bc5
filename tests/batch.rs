//! End-to-end batch runs over a temporary folder of portraits.
//!
//! Every test centers on the subject (no face model needed) unless it plugs in a stub detector.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use headshot_processor::image_processing::encode::inspect_jpeg;
use headshot_processor::image_processing::face_detection::{FaceBox, FaceDetector};
use headshot_processor::image_processing::presets::{ICON, WEB};
use headshot_processor::image_processing::progress::ProgressObserver;
use headshot_processor::{
    DerivativeOutcome, FileOutcome, ProcessingConfig, ProcessingEngine, SkipReason, ALL_PRESETS,
};
use image::{GrayImage, Rgba, RgbaImage};

#[derive(Default)]
struct Recorder {
    files: Mutex<Vec<String>>,
    statuses: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl ProgressObserver for Recorder {
    fn current_file(&self, name: &str) {
        self.files.lock().unwrap().push(name.to_string());
    }

    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

struct NoFaces;

impl FaceDetector for NoFaces {
    fn detect(&self, _gray: &GrayImage) -> Result<Vec<FaceBox>> {
        Ok(Vec::new())
    }
}

fn center_only() -> ProcessingConfig {
    ProcessingConfig {
        detect_faces: false,
        ..Default::default()
    }
}

/// Transparent canvas with an opaque figure in the middle
fn write_portrait(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let inside = x > width / 4 && x < width * 3 / 4 && y > height / 5;
        if inside {
            Rgba([210, 170, 150, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

#[test]
fn corrupt_file_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_portrait(dir.path(), "a.png", 300, 400);
    write_portrait(dir.path(), "b.png", 320, 380);
    std::fs::write(dir.path().join("c.png"), b"not an image").unwrap();
    write_portrait(dir.path(), "d.png", 280, 420);

    let engine = ProcessingEngine::new(center_only()).unwrap();
    let files = engine.discover_images(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(files.len(), 4);

    let recorder = Recorder::default();
    let result = engine.process_batch(&files, &recorder).unwrap();

    assert_eq!(result.summary.total, 4);
    assert_eq!(result.summary.completed, 3);
    assert_eq!(result.summary.failed, 1);
    assert_eq!(result.summary.derivatives_written, 12);
    assert_eq!(result.summary.warnings, 1);
    assert!(matches!(result.outcomes[2].1, FileOutcome::Failed(_)));

    for stem in ["a", "b", "d"] {
        for preset in ALL_PRESETS {
            let path = dir.path().join("Output").join(stem).join(preset.file_name(stem));
            assert!(path.exists(), "missing {}", path.display());
        }
    }
    let corrupt_dir = dir.path().join("Output").join("c");
    assert!(corrupt_dir.is_dir());
    assert_eq!(std::fs::read_dir(&corrupt_dir).unwrap().count(), 0);

    let statuses = recorder.statuses.lock().unwrap();
    assert_eq!(statuses.len(), 5);
    assert_eq!(statuses[0], "(1/4) Processing image...");
    assert_eq!(statuses[4], "Processing complete! (4 images processed)");
    assert_eq!(*recorder.files.lock().unwrap(), vec!["a.png", "b.png", "c.png", "d.png"]);
}

#[test]
fn derivatives_carry_size_and_dpi() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_portrait(dir.path(), "jane.png", 600, 800);

    let engine = ProcessingEngine::new(center_only()).unwrap();
    let result = engine.process_batch(&[input], &Recorder::default()).unwrap();
    assert_eq!(result.summary.completed, 1);

    for preset in ALL_PRESETS {
        let path = dir.path().join("Output").join("jane").join(preset.file_name("jane"));
        let ((width, height), density) = inspect_jpeg(&path).unwrap();
        assert_eq!((width, height), (preset.output_width, preset.output_height));
        assert_eq!(density.and_then(|d| d.dpi()), Some(preset.target_dpi));
    }
}

#[test]
fn output_root_override_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let exports = tempfile::tempdir().unwrap();
    let input = write_portrait(dir.path(), "sam.png", 200, 260);

    let config = ProcessingConfig {
        output_root: Some(exports.path().to_path_buf()),
        ..center_only()
    };
    let engine = ProcessingEngine::new(config).unwrap().with_presets(&[WEB]);
    engine.process_batch(&[input], &Recorder::default()).unwrap();

    assert!(exports.path().join("sam").join("sam_web.jpg").exists());
    assert!(!dir.path().join("Output").exists());
}

#[test]
fn missing_face_leaves_icon_unwritten() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_portrait(dir.path(), "lee.png", 300, 400);

    let engine = ProcessingEngine::with_detector(ProcessingConfig::default(), Box::new(NoFaces))
        .with_presets(&[ICON]);
    let recorder = Recorder::default();
    let result = engine.process_batch(&[input], &recorder).unwrap();

    match &result.outcomes[0].1 {
        FileOutcome::Completed(report) => {
            assert!(matches!(
                report.derivatives[0].outcome,
                DerivativeOutcome::Skipped(SkipReason::NoFace)
            ));
        }
        other => panic!("expected a completed file, got {:?}", other),
    }
    assert_eq!(result.summary.derivatives_skipped, 1);
    let lee_dir = dir.path().join("Output").join("lee");
    assert!(lee_dir.is_dir());
    assert!(!lee_dir.join("lee_icon.jpg").exists());
    assert!(recorder
        .warnings
        .lock()
        .unwrap()
        .iter()
        .any(|w| w == "No face detected. Please crop this lee_icon.jpg image manually. Thank you!."));
}

#[test]
fn dry_run_creates_no_folders() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_portrait(dir.path(), "kim.png", 200, 260);

    let config = ProcessingConfig {
        dry_run: true,
        ..center_only()
    };
    let engine = ProcessingEngine::new(config).unwrap();
    let result = engine.process_batch(&[input], &Recorder::default()).unwrap();

    assert_eq!(result.summary.completed, 1);
    assert_eq!(result.summary.derivatives_written, 0);
    assert_eq!(result.summary.derivatives_planned, 4);
    assert!(!dir.path().join("Output").exists());
}

#[test]
fn parallel_run_matches_sequential_counts() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..4 {
        write_portrait(dir.path(), &format!("p{}.png", i), 200 + i * 10, 300);
    }

    let config = ProcessingConfig {
        parallel_jobs: 3,
        ..center_only()
    };
    let engine = ProcessingEngine::new(config).unwrap().with_presets(&[ICON, WEB]);
    let files = engine.discover_images(&[dir.path().to_path_buf()]).unwrap();
    let result = engine.process_batch(&files, &Recorder::default()).unwrap();

    assert_eq!(result.summary.completed, 4);
    assert_eq!(result.summary.derivatives_written, 8);
    let order: Vec<_> = result.outcomes.iter().map(|(p, _)| p.clone()).collect();
    assert_eq!(order, files);
}

#[test]
fn cancelled_batch_processes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_portrait(dir.path(), "late.png", 200, 260);

    let engine = ProcessingEngine::new(center_only()).unwrap();
    engine.cancel_flag().store(true, Ordering::Relaxed);
    let result = engine.process_batch(&[input], &Recorder::default()).unwrap();

    assert_eq!(result.summary.cancelled, 1);
    assert!(!dir.path().join("Output").exists());
}

/// Stops the batch as soon as the first file is done
struct StopAfterFirst {
    cancel: Arc<AtomicBool>,
}

impl ProgressObserver for StopAfterFirst {
    fn current_file(&self, _name: &str) {}
    fn status(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}

    fn file_finished(&self, _input: &Path, _outcome: &FileOutcome) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

#[test]
fn cancel_from_observer_stops_remaining_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.png", "b.png", "c.png"] {
        write_portrait(dir.path(), name, 200, 260);
    }

    let engine = ProcessingEngine::new(center_only()).unwrap().with_presets(&[WEB]);
    let files = engine.discover_images(&[dir.path().to_path_buf()]).unwrap();
    let observer = StopAfterFirst {
        cancel: engine.cancel_flag(),
    };
    let result = engine.process_batch(&files, &observer).unwrap();

    assert!(matches!(result.outcomes[0].1, FileOutcome::Completed(_)));
    assert!(matches!(result.outcomes[1].1, FileOutcome::Cancelled));
    assert!(matches!(result.outcomes[2].1, FileOutcome::Cancelled));
    assert_eq!(result.summary.completed, 1);
    assert_eq!(result.summary.cancelled, 2);
    assert!(dir.path().join("Output").join("a").join("a_web.jpg").exists());
    assert!(!dir.path().join("Output").join("b").exists());
}

#[test]
fn empty_folder_reports_no_images() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ProcessingEngine::new(center_only()).unwrap();
    let files = engine.discover_images(&[dir.path().to_path_buf()]).unwrap();

    let recorder = Recorder::default();
    let result = engine.process_batch(&files, &recorder).unwrap();

    assert_eq!(result.summary.total, 0);
    assert_eq!(
        *recorder.statuses.lock().unwrap(),
        vec!["No PNG images found in the selected folder.".to_string()]
    );
}
