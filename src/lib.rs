// Library exports for reuse by the CLI and integration tests
pub mod cli;
pub mod config_file;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use image_processing::batch::BatchSummary;
pub use image_processing::presets::{PresetKind, SizePreset, ALL_PRESETS};
pub use image_processing::{
    DerivativeOutcome, FileOutcome, FileReport, ProcessingConfig, ProcessingEngine, SkipReason,
};
pub use json_output::JsonMessage;
