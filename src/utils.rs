use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::cli::Args;

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(progress_style) = ProgressStyle::with_template(
        "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta})",
    ) {
        pb.set_style(progress_style.progress_chars("#>-"));
    }
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Validate command line arguments
pub fn validate_inputs(args: &Args) -> Result<()> {
    if args.input_paths.is_empty() {
        return Err(anyhow::anyhow!("No input directory or file specified"));
    }

    // Validate input paths (directories or files)
    for input_path in &args.input_paths {
        if !input_path.exists() {
            return Err(anyhow::anyhow!(
                "Input path does not exist: {}",
                input_path.display()
            ));
        }
        if !input_path.is_dir() && !input_path.is_file() {
            return Err(anyhow::anyhow!(
                "Input path is neither a file nor a directory: {}",
                input_path.display()
            ));
        }
    }

    if let Some(output) = &args.output_dir {
        if output.is_file() {
            return Err(anyhow::anyhow!(
                "Output path is a file, expected a directory: {}",
                output.display()
            ));
        }
    }

    // Validate extensions
    if args.parse_extensions().is_empty() {
        return Err(anyhow::anyhow!("No valid extensions specified"));
    }

    args.parse_presets().map_err(|e| anyhow::anyhow!(e))?;

    // Validate job count
    if args.jobs > 32 {
        return Err(anyhow::anyhow!(
            "Job count too high (max 32), got: {}",
            args.jobs
        ));
    }

    // Validate face detection is available
    if args.detect_faces() {
        #[cfg(not(feature = "face-detection"))]
        {
            return Err(anyhow::anyhow!(
                "Face detection is not available. \
                 Rebuild with --features face-detection or pass --center-only"
            ));
        }

        match &args.face_model {
            None => {
                return Err(anyhow::anyhow!(
                    "Face centering needs a SeetaFace model: pass --face-model <FILE>, or use --center-only"
                ))
            }
            Some(model) if !model.is_file() => {
                return Err(anyhow::anyhow!(
                    "Face model file does not exist: {}",
                    model.display()
                ))
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file has one of the specified extensions
pub fn has_valid_extension(path: &Path, extensions: &[String]) -> bool {
    if let Some(ext) = get_file_extension(path) {
        extensions.contains(&ext)
    } else {
        false
    }
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print warning message
pub fn warn_println(message: &str) {
    println!("{} {}", style("[WARNING]").yellow().bold(), message);
}

/// Print error message
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}
