use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

use headshot_processor::cli::Args;
use headshot_processor::image_processing::batch::BatchSummary;
use headshot_processor::image_processing::encode::inspect_jpeg;
use headshot_processor::image_processing::progress::ProgressObserver;
use headshot_processor::image_processing::report::ProcessingReport;
use headshot_processor::image_processing::{
    DerivativeOutcome, FileOutcome, ProcessingConfig, ProcessingEngine,
};
use headshot_processor::json_output::{JsonMessage, JsonObserver};
use headshot_processor::utils::{
    create_progress_bar, error_println, format_duration, validate_inputs, verbose_println,
    warn_println,
};

/// Terminal observer driving a single progress bar
struct ConsoleObserver {
    progress: ProgressBar,
    verbose: bool,
}

impl ProgressObserver for ConsoleObserver {
    fn current_file(&self, name: &str) {
        self.progress.set_message(name.to_string());
    }

    fn status(&self, message: &str) {
        if self.verbose {
            self.progress.suspend(|| verbose_println(true, message));
        }
    }

    fn warning(&self, message: &str) {
        self.progress.suspend(|| warn_println(message));
    }

    fn file_finished(&self, input: &Path, outcome: &FileOutcome) {
        if let FileOutcome::Skipped(reason) = outcome {
            let name = input.file_name().and_then(|f| f.to_str()).unwrap_or("unknown");
            self.progress
                .suspend(|| warn_println(&format!("{}: skipped ({})", name, reason)));
        }
        self.progress.inc(1);
    }
}

/// Print size and resolution of finished derivatives
fn handle_inspect(paths: &[PathBuf]) -> Result<()> {
    println!("{}", style("Inspecting JPEG files:").bold().cyan());
    println!();

    for path in paths {
        match inspect_jpeg(path) {
            Ok(((width, height), density)) => {
                let dpi = density
                    .and_then(|d| d.dpi())
                    .map(|dpi| format!("{} DPI", dpi))
                    .unwrap_or_else(|| "no DPI recorded".to_string());
                println!(
                    "  {}: {}x{} @ {}",
                    style(path.display()).bold(),
                    style(width).green(),
                    style(height).green(),
                    style(dpi).cyan()
                );
            }
            Err(e) => error_println(&format!("{}: {:#}", path.display(), e)),
        }
    }

    Ok(())
}

fn print_summary(summary: &BatchSummary, outcomes: &[(PathBuf, FileOutcome)], dry_run: bool) {
    println!();
    if dry_run {
        println!("{}", style("Dry Run Results Summary:").bold().cyan());
    } else {
        println!("{}", style("Results Summary:").bold().green());
    }

    println!("  Images: {}", style(summary.total).bold());
    println!("  Completed: {}", style(summary.completed).bold().green());
    if summary.skipped > 0 {
        println!("  Skipped: {}", style(summary.skipped).bold().yellow());
    }
    if summary.failed > 0 {
        println!("  Failed: {}", style(summary.failed).bold().red());
    }
    if summary.cancelled > 0 {
        println!("  Cancelled: {}", style(summary.cancelled).bold().yellow());
    }
    if dry_run {
        println!(
            "  Derivatives (would be created): {}",
            style(summary.derivatives_planned).bold().cyan()
        );
    } else {
        println!(
            "  Derivatives written: {}",
            style(summary.derivatives_written).bold().green()
        );
    }
    if summary.derivatives_skipped > 0 {
        println!(
            "  Derivatives needing a manual crop: {}",
            style(summary.derivatives_skipped).bold().yellow()
        );
    }
    if summary.warnings > 0 {
        println!("  Warnings: {}", style(summary.warnings).bold().yellow());
    }

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!("  Total time: {}", style(format_duration(summary.duration)).bold());
    if summary.total > 0 {
        println!(
            "  Average per image: {}",
            style(format_duration(summary.duration / summary.total as u32)).dim()
        );
    }

    let failures: Vec<_> = outcomes
        .iter()
        .filter_map(|(path, outcome)| match outcome {
            FileOutcome::Failed(error) => Some((path, error)),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        println!();
        println!("{}", style("Errors encountered:").bold().red());
        for (i, (path, error)) in failures.iter().enumerate() {
            let filename = path.file_name().and_then(|f| f.to_str()).unwrap_or("unknown");
            println!(
                "  {} {}: {}",
                style(format!("#{}", i + 1)).dim(),
                style(filename).bold().red(),
                error
            );
        }
    }

    if dry_run {
        let planned: Vec<_> = outcomes
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                FileOutcome::Completed(report) => Some(report),
                _ => None,
            })
            .flat_map(|report| report.derivatives.iter())
            .filter_map(|d| match &d.outcome {
                DerivativeOutcome::WouldWrite(path) => Some(path),
                _ => None,
            })
            .collect();
        if !planned.is_empty() {
            println!();
            println!("{}", style("Output files (would be created):").bold().cyan());
            for path in planned {
                println!("  {}", style(path.display()).dim());
            }
        }
    }
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    args.load_and_merge_config()?;

    let json_mode = args.json_progress;

    if !json_mode {
        println!("{}", style("Headshot Processor").bold().blue());
        println!("{}", style("Centered print and web headshots from transparent PNGs").dim());
        println!();
    }

    if !args.inspect.is_empty() {
        return handle_inspect(&args.inspect);
    }

    validate_inputs(&args)?;
    let presets = args.parse_presets().map_err(|e| anyhow::anyhow!(e))?;

    let config = ProcessingConfig {
        detect_faces: args.detect_faces(),
        face_model: args.face_model.clone(),
        output_root: args.output_dir.clone(),
        extensions: args.parse_extensions(),
        verbose: args.verbose && !json_mode,
        parallel_jobs: args.effective_jobs(),
        dry_run: args.dry_run,
    };

    if !json_mode {
        println!("{}", style("Configuration:").bold());
        for input in &args.input_paths {
            println!("  Input: {}", style(input.display()).cyan());
        }
        match &config.output_root {
            Some(root) => println!("  Output: {}", style(root.display()).cyan()),
            None => println!("  Output: {}", style("Output/ next to each input").cyan()),
        }
        let centering = if config.detect_faces { "largest face" } else { "subject center" };
        println!("  Centering: {}", style(centering).cyan());
        let names: Vec<String> = presets.iter().map(|p| p.suffix()).collect();
        println!("  Presets: {}", style(names.join(", ")).cyan());
        println!("  Jobs: {}", style(config.parallel_jobs).cyan());
        if config.dry_run {
            println!("  {}", style("Dry run: no files will be written").yellow());
        }
        println!();
    }

    let dry_run = config.dry_run;
    let engine = ProcessingEngine::new(config)?.with_presets(&presets);
    let image_files = engine.discover_images(&args.input_paths)?;

    let result = if json_mode {
        let result = engine.process_batch(&image_files, &JsonObserver)?;
        JsonMessage::summary(&result.summary).emit();
        result
    } else {
        if image_files.is_empty() {
            println!(
                "{}",
                style(headshot_processor::image_processing::NO_IMAGES_STATUS).red()
            );
            return Ok(());
        }

        let progress = create_progress_bar(image_files.len() as u64);
        let observer = ConsoleObserver {
            progress: progress.clone(),
            verbose: args.verbose,
        };
        let result = engine.process_batch(&image_files, &observer)?;
        progress.finish_with_message("done");
        print_summary(&result.summary, &result.outcomes, dry_run);
        result
    };

    if args.report && !json_mode {
        ProcessingReport::from_outcomes(engine.presets(), &result.outcomes).print(&result.summary);
    }

    Ok(())
}
