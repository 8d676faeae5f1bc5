//! Per-image report for the `--report` flag
//!
//! One row per source image with the outcome of every derivative, followed by a short summary.

use prettytable::{format, Cell, Row, Table};
use std::path::{Path, PathBuf};

use super::batch::BatchSummary;
use super::presets::SizePreset;
use super::{DerivativeOutcome, DerivativeReport, FileOutcome};

/// One source image in the report
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub input_filename: String,
    /// File-level status: `done`, or why the whole file was skipped or failed
    pub status: String,
    /// Subject box on the working image, `WxH@X,Y`
    pub subject: String,
    /// One cell per preset column, in preset order
    pub derivatives: Vec<String>,
}

#[derive(Debug)]
pub struct ProcessingReport {
    pub presets: Vec<SizePreset>,
    pub entries: Vec<ReportEntry>,
}

impl ProcessingReport {
    pub fn new(presets: &[SizePreset]) -> Self {
        Self {
            presets: presets.to_vec(),
            entries: Vec::new(),
        }
    }

    /// Build a report from batch outcomes, in input order
    pub fn from_outcomes(presets: &[SizePreset], outcomes: &[(PathBuf, FileOutcome)]) -> Self {
        let mut report = Self::new(presets);
        for (path, outcome) in outcomes {
            report.add(path, outcome);
        }
        report
    }

    pub fn add(&mut self, input_path: &Path, outcome: &FileOutcome) {
        let blank = || vec![String::new(); self.presets.len()];

        let entry = match outcome {
            FileOutcome::Completed(file) => {
                let derivatives = self
                    .presets
                    .iter()
                    .map(|preset| {
                        file.derivatives
                            .iter()
                            .find(|d| d.preset == preset.kind)
                            .map(format_derivative)
                            .unwrap_or_default()
                    })
                    .collect();
                ReportEntry {
                    input_filename: extract_filename(input_path),
                    status: "done".to_string(),
                    subject: format!(
                        "{}x{}@{},{}",
                        file.subject.width, file.subject.height, file.subject.x, file.subject.y
                    ),
                    derivatives,
                }
            }
            FileOutcome::Skipped(reason) => ReportEntry {
                input_filename: extract_filename(input_path),
                status: format!("skipped: {}", reason),
                subject: String::new(),
                derivatives: blank(),
            },
            FileOutcome::Failed(error) => ReportEntry {
                input_filename: extract_filename(input_path),
                status: format!("failed: {}", truncate(error, 40)),
                subject: String::new(),
                derivatives: blank(),
            },
            FileOutcome::Cancelled => ReportEntry {
                input_filename: extract_filename(input_path),
                status: "cancelled".to_string(),
                subject: String::new(),
                derivatives: blank(),
            },
        };

        self.entries.push(entry);
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        let mut header = vec![Cell::new("Input"), Cell::new("Status"), Cell::new("Subject")];
        header.extend(self.presets.iter().map(|p| Cell::new(&p.suffix())));
        table.add_row(Row::new(header));

        for entry in &self.entries {
            let mut cells = vec![
                Cell::new(&truncate(&entry.input_filename, 25)),
                Cell::new(&entry.status),
                Cell::new(&entry.subject),
            ];
            cells.extend(entry.derivatives.iter().map(|d| Cell::new(d)));
            table.add_row(Row::new(cells));
        }

        table
    }

    /// Print the complete report as a formatted table
    pub fn print(&self, summary: &BatchSummary) {
        println!("\n╔══════════════════════════════════════════════════════════════════════════╗");
        println!("║                                 REPORT                                   ║");
        println!("╚══════════════════════════════════════════════════════════════════════════╝\n");

        if !self.entries.is_empty() {
            println!("📷 HEADSHOTS ({} total)\n", self.entries.len());
            self.to_table().printstd();
            println!();
        }

        println!("📊 Summary:");
        println!("   • Images: {}", summary.total);
        println!(
            "   • Completed: {} ({:.1}%)",
            summary.completed,
            summary.success_rate()
        );
        println!("   • Skipped: {}", summary.skipped);
        println!("   • Failed: {}", summary.failed);
        println!(
            "   • Derivatives written: {} (skipped: {})",
            summary.derivatives_written, summary.derivatives_skipped
        );
        println!();
    }
}

/// Report cell for one derivative
fn format_derivative(derivative: &DerivativeReport) -> String {
    let mark = match &derivative.outcome {
        DerivativeOutcome::Written(_) => "✓".to_string(),
        DerivativeOutcome::WouldWrite(_) => "○ dry".to_string(),
        DerivativeOutcome::Skipped(reason) => format!("✗ {}", reason),
    };

    if derivative.clipped_columns > 0 {
        format!("{} (clip {}px)", mark, derivative.clipped_columns)
    } else {
        mark
    }
}

/// Truncate string to fit in column
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

/// Helper to extract filename from path
pub fn extract_filename(path: &Path) -> String {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::presets::{PresetKind, ALL_PRESETS};
    use crate::image_processing::subject::BoundingBox;
    use crate::image_processing::{FileReport, SkipReason};

    fn completed() -> FileOutcome {
        FileOutcome::Completed(FileReport {
            input_path: PathBuf::from("/photos/jane.png"),
            output_dir: PathBuf::from("/photos/Output/jane"),
            subject: BoundingBox::new(10, 0, 200, 300),
            derivatives: vec![
                DerivativeReport {
                    preset: PresetKind::Cutout,
                    output_path: PathBuf::from("jane_cutout.jpg"),
                    outcome: DerivativeOutcome::Written(PathBuf::from("jane_cutout.jpg")),
                    clipped_columns: 14,
                },
                DerivativeReport {
                    preset: PresetKind::Icon,
                    output_path: PathBuf::from("jane_icon.jpg"),
                    outcome: DerivativeOutcome::Skipped(SkipReason::NoFace),
                    clipped_columns: 0,
                },
            ],
        })
    }

    #[test]
    fn test_entry_per_file_with_preset_cells() {
        let outcomes = vec![
            (PathBuf::from("/photos/jane.png"), completed()),
            (PathBuf::from("/photos/flat.png"), FileOutcome::Skipped(SkipReason::NoAlphaChannel)),
        ];
        let report = ProcessingReport::from_outcomes(&ALL_PRESETS, &outcomes);

        assert_eq!(report.entries.len(), 2);
        let jane = &report.entries[0];
        assert_eq!(jane.input_filename, "jane.png");
        assert_eq!(jane.subject, "200x300@10,0");
        assert_eq!(jane.derivatives[0], "✓ (clip 14px)");
        assert_eq!(jane.derivatives[1], "");
        assert!(jane.derivatives[2].starts_with("✗ no face"));

        let flat = &report.entries[1];
        assert_eq!(flat.status, "skipped: no alpha channel");
        assert_eq!(flat.derivatives.len(), 4);
    }

    #[test]
    fn test_table_has_header_and_rows() {
        let outcomes = vec![(PathBuf::from("a.png"), FileOutcome::Failed("bad header".to_string()))];
        let report = ProcessingReport::from_outcomes(&ALL_PRESETS, &outcomes);
        let table = report.to_table();
        assert_eq!(table.len(), 2);
        assert_eq!(report.entries[0].status, "failed: bad header");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }
}
