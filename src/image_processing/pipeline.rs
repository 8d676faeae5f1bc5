use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use super::center::{center_on_canvas, CenterOptions, CenterOutcome};
use super::crop::crop_and_scale;
use super::encode::save_jpeg;
use super::face_detection::FaceDetector;
use super::presets::{SizePreset, HEADROOM_OFFSET, WORKING_MAX_HEIGHT, WORKING_MAX_WIDTH};
use super::progress::{no_face_warning, ProgressObserver};
use super::resize::scale_to_fit;
use super::subject::{locate_in_alpha, BoundingBox};
use super::{DerivativeOutcome, DerivativeReport, FileOutcome, FileReport, SkipReason};

/// Per-run settings shared by every file
pub struct PipelineOptions<'a> {
    pub presets: &'a [SizePreset],
    /// Face detector used for centering; `None` centers on the subject's middle column
    pub detector: Option<&'a dyn FaceDetector>,
    pub dry_run: bool,
    pub cancel: &'a AtomicBool,
}

/// Produce every derivative of one source portrait into `output_dir`
///
/// The subject is located once on the bounded working image and the same region feeds all
/// presets. A missing alpha channel or subject skips the whole file; per-preset failures only
/// skip that derivative. Decode and write errors are returned to the caller.
pub fn process_file(
    input_path: &Path,
    output_dir: &Path,
    options: &PipelineOptions<'_>,
    observer: &dyn ProgressObserver,
) -> Result<FileOutcome> {
    let file_name = display_name(input_path);
    let base_name = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();

    // Stage 1: decode and bound the working resolution
    let working = {
        let decoded = image::open(input_path)
            .with_context(|| format!("Failed to open image: {}", input_path.display()))?;

        if !decoded.color().has_alpha() {
            observer.warning(&format!(
                "{}: the image does not contain an alpha channel (transparency).",
                file_name
            ));
            return Ok(FileOutcome::Skipped(SkipReason::NoAlphaChannel));
        }

        let rgba = decoded.to_rgba8();
        drop(decoded);
        scale_to_fit(&rgba, WORKING_MAX_WIDTH, WORKING_MAX_HEIGHT)
            .with_context(|| format!("Failed to bound working size of {}", file_name))?
    };

    // Stage 2: locate the subject once for all presets
    let subject = match locate_in_alpha(&working) {
        Some(subject) => subject,
        None => {
            observer.warning(&format!("{}: no subject found in the alpha channel.", file_name));
            return Ok(FileOutcome::Skipped(SkipReason::NoSubject));
        }
    };
    let region = subject.shifted_up(HEADROOM_OFFSET);

    // Stage 3: one derivative per preset, serially to bound memory
    let mut derivatives = Vec::with_capacity(options.presets.len());
    for (index, preset) in options.presets.iter().enumerate() {
        let output_path = output_dir.join(preset.file_name(&base_name));

        if options.cancel.load(Ordering::Relaxed) {
            derivatives.push(DerivativeReport {
                preset: preset.kind,
                output_path,
                outcome: DerivativeOutcome::Skipped(SkipReason::Cancelled),
                clipped_columns: 0,
            });
            continue;
        }

        let report = derive(&working, &region, preset, output_path, options, observer)?;
        derivatives.push(report);

        let percent = ((index + 1) * 100 / options.presets.len()) as u8;
        observer.image_progress(percent);
    }

    Ok(FileOutcome::Completed(FileReport {
        input_path: input_path.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        subject,
        derivatives,
    }))
}

/// Crop, center and write a single derivative
fn derive(
    working: &RgbaImage,
    region: &BoundingBox,
    preset: &SizePreset,
    output_path: std::path::PathBuf,
    options: &PipelineOptions<'_>,
    observer: &dyn ProgressObserver,
) -> Result<DerivativeReport> {
    let output_name = display_name(&output_path);
    let skipped = |reason: SkipReason, output_path: std::path::PathBuf| DerivativeReport {
        preset: preset.kind,
        output_path,
        outcome: DerivativeOutcome::Skipped(reason),
        clipped_columns: 0,
    };

    let cutout = match crop_and_scale(working, region, preset.output_height) {
        Ok(cutout) => cutout,
        Err(e) => {
            observer.warning(&format!("{}: crop failed: {:#}", output_name, e));
            return Ok(skipped(SkipReason::CropFailed(format!("{:#}", e)), output_path));
        }
    };

    let center_options = CenterOptions {
        canvas_width: preset.output_width,
        canvas_height: preset.output_height,
        target_dpi: preset.target_dpi,
        zoom: true,
        zoom_factor: preset.zoom_factor,
    };

    let centered = match center_on_canvas(&cutout, &center_options, options.detector) {
        Ok(CenterOutcome::Centered(centered)) => centered,
        Ok(CenterOutcome::NoFace) => {
            observer.warning(&no_face_warning(&output_name));
            return Ok(skipped(SkipReason::NoFace, output_path));
        }
        Err(e) => {
            observer.warning(&format!("{}: centering failed: {:#}", output_name, e));
            return Ok(skipped(SkipReason::CenterFailed(format!("{:#}", e)), output_path));
        }
    };
    drop(cutout);

    if centered.clipped_columns > 0 {
        observer.warning(&format!(
            "{}: {} subject columns fell outside the {}px canvas",
            output_name, centered.clipped_columns, preset.output_width
        ));
    }

    let outcome = if options.dry_run {
        DerivativeOutcome::WouldWrite(output_path.clone())
    } else {
        save_jpeg(&centered.image, centered.dpi, &output_path)?;
        DerivativeOutcome::Written(output_path.clone())
    };

    Ok(DerivativeReport {
        preset: preset.kind,
        output_path,
        outcome,
        clipped_columns: centered.clipped_columns,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unknown")
        .to_string()
}
