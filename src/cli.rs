use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use crate::image_processing::presets::{PresetKind, SizePreset};

#[derive(Parser, Debug)]
#[command(
    name = "headshot-processor",
    about = "Batch processor that turns transparent PNG portraits into print and web headshots",
    long_about = "
Headshot Processor

Takes PNG portraits whose background has already been removed and writes four JPEG
derivatives per image into Output/<name>/ next to the source:

• <name>_cutout.jpg   2100x1800 at 300 DPI
• <name>_5x7.jpg      1500x2100 at 300 DPI
• <name>_icon.jpg      120x155  at  72 DPI
• <name>_web.jpg       300x420  at  72 DPI

Each derivative is cropped to the subject, scaled to the target height and centered
horizontally on the largest detected face over a white background.

Example Usage:
  # Process every PNG in a folder (face centering needs a SeetaFace model)
  headshot-processor -i ~/Headshots --face-model ./seeta_fd_frontal_v1.0.bin

  # Center on the subject's middle instead of the face
  headshot-processor -i ~/Headshots --center-only

  # Write into a separate tree, four files at a time
  headshot-processor -i ~/Headshots -o ~/Exports --center-only -j 4

  # Only the web and icon sizes
  headshot-processor -i ~/Headshots --center-only --presets web,icon

  # Show what would be written without touching the disk
  headshot-processor -i ~/Headshots --center-only --dry-run --verbose

  # Check size and DPI of finished files
  headshot-processor --inspect ~/Headshots/Output/jane/jane_5x7.jpg"
)]
pub struct Args {
    /// Input directories or single PNG files (can be specified multiple times)
    #[arg(
        short = 'i',
        long = "input",
        required_unless_present_any = ["inspect", "config_file"],
        value_name = "DIR|FILE"
    )]
    pub input_paths: Vec<PathBuf>,

    /// Root for per-image output folders (default: Output/ next to each input)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// SeetaFace frontal detection model used for face centering
    #[arg(long = "face-model", value_name = "FILE")]
    pub face_model: Option<PathBuf>,

    /// Center on the subject's horizontal middle instead of the largest face
    #[arg(long = "center-only")]
    pub center_only: bool,

    /// Comma-separated list of derivatives to produce: cutout, 5x7, icon, web
    #[arg(long = "presets", default_value = "cutout,5x7,icon,web", value_name = "LIST")]
    pub presets_str: String,

    /// Comma-separated list of image extensions to process
    #[arg(long = "extensions", default_value = "png")]
    pub extensions_str: String,

    /// Number of files processed concurrently (1 = sequential, 0 = one per CPU core)
    #[arg(short = 'j', long = "jobs", default_value = "1", value_name = "N")]
    pub jobs: usize,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Perform a dry run: run the full pipeline but write no files
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Generate a per-image report table at the end
    #[arg(long = "report")]
    pub report: bool,

    /// Emit progress as JSON lines on stdout, suppressing all other output
    #[arg(long = "json-progress")]
    pub json_progress: bool,

    /// Load options from a JSON configuration file; command-line flags take precedence
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Print dimensions and DPI of existing JPEG files and exit
    #[arg(long = "inspect", value_name = "FILE", num_args = 1..)]
    pub inspect: Vec<PathBuf>,
}

impl Args {
    /// Parse the extensions string into a vector
    pub fn parse_extensions(&self) -> Vec<String> {
        self.extensions_str
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Parse the preset list, keeping the fixed pipeline order
    pub fn parse_presets(&self) -> Result<Vec<SizePreset>, String> {
        let mut kinds = Vec::new();

        for name in self.presets_str.split(',') {
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }

            let kind = PresetKind::from_str(&name).map_err(|_| {
                format!(
                    "Invalid preset '{}'. Valid presets: cutout, 5x7, icon, web",
                    name
                )
            })?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        if kinds.is_empty() {
            return Err("No presets specified".to_string());
        }

        kinds.sort();
        Ok(kinds.into_iter().map(PresetKind::preset).collect())
    }

    pub fn detect_faces(&self) -> bool {
        !self.center_only
    }

    /// Resolve `--jobs 0` to the number of CPU cores
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }
}


// Default implementation for tests
#[cfg(test)]
impl Default for Args {
    fn default() -> Self {
        Self {
            input_paths: vec![],
            output_dir: None,
            face_model: None,
            center_only: false,
            presets_str: "cutout,5x7,icon,web".to_string(),
            extensions_str: "png".to_string(),
            jobs: 1,
            verbose: false,
            dry_run: false,
            report: false,
            json_progress: false,
            config_file: None,
            inspect: vec![],
        }
    }
}
