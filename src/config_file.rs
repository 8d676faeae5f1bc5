use crate::cli::Args;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Saved batch settings, as written by `--config`
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub name: Option<String>,
    pub config: ProcessingConfigJson,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingConfigJson {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub face_model: Option<String>,
    pub center_only: Option<bool>,
    pub presets: Option<String>,
    pub extensions: Option<String>,
    pub jobs: Option<usize>,
    pub verbose: Option<bool>,
    pub dry_run: Option<bool>,
    pub report: Option<bool>,
}

impl Args {
    /// Load configuration from a JSON file and merge with command-line arguments
    /// Command-line arguments take precedence over config file values
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let contents = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: ConfigFile = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            let args_from_cli = std::env::args().collect::<Vec<_>>();
            self.merge_from_config(config.config, &args_from_cli);

            if self.verbose && !self.json_progress {
                eprintln!("Loaded configuration from: {:?}", config_path);
            }
        }
        Ok(())
    }

    /// Apply config values for every option not given in `args_from_cli`
    pub fn merge_from_config(&mut self, config: ProcessingConfigJson, args_from_cli: &[String]) {
        let given = |flags: &[&str]| {
            args_from_cli
                .iter()
                .any(|a| flags.iter().any(|f| a == f || a.starts_with(&format!("{}=", f))))
        };

        if !given(&["-i", "--input"]) {
            if let Some(input) = config.input_path {
                self.input_paths = vec![PathBuf::from(input)];
            }
        }

        if !given(&["-o", "--output"]) {
            if let Some(output) = config.output_path {
                self.output_dir = Some(PathBuf::from(output));
            }
        }

        if !given(&["--face-model"]) {
            if let Some(model) = config.face_model {
                self.face_model = Some(PathBuf::from(model));
            }
        }

        if !given(&["--presets"]) {
            if let Some(presets) = config.presets {
                self.presets_str = presets;
            }
        }

        if !given(&["--extensions"]) {
            if let Some(ext) = config.extensions {
                self.extensions_str = ext;
            }
        }

        if !given(&["-j", "--jobs"]) {
            if let Some(jobs) = config.jobs {
                self.jobs = jobs;
            }
        }

        // Boolean flags - only apply if currently false (default)
        if !self.center_only {
            self.center_only = config.center_only.unwrap_or(false);
        }

        if !self.verbose {
            self.verbose = config.verbose.unwrap_or(false);
        }

        if !self.dry_run {
            self.dry_run = config.dry_run.unwrap_or(false);
        }

        if !self.report {
            self.report = config.report.unwrap_or(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_parses_camel_case() {
        let json = r#"{
            "name": "Staff headshots",
            "config": {
                "inputPath": "/photos",
                "faceModel": "/models/seeta.bin",
                "centerOnly": true,
                "jobs": 4,
                "dryRun": true
            }
        }"#;
        let config: ConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(config.name.as_deref(), Some("Staff headshots"));
        assert_eq!(config.config.face_model.as_deref(), Some("/models/seeta.bin"));
        assert_eq!(config.config.center_only, Some(true));
        assert_eq!(config.config.jobs, Some(4));
        assert!(config.config.report.is_none());
    }

    #[test]
    fn test_config_fills_unset_options() {
        let mut args = Args::default();
        let config = ProcessingConfigJson {
            input_path: Some("/photos".to_string()),
            output_path: Some("/exports".to_string()),
            presets: Some("web".to_string()),
            center_only: Some(true),
            report: Some(true),
            ..Default::default()
        };

        args.merge_from_config(config, &cli(&["headshot-processor", "--config", "c.json"]));

        assert_eq!(args.input_paths, vec![PathBuf::from("/photos")]);
        assert_eq!(args.output_dir, Some(PathBuf::from("/exports")));
        assert_eq!(args.presets_str, "web");
        assert!(args.center_only);
        assert!(args.report);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_cli_takes_precedence() {
        let mut args = Args {
            input_paths: vec![PathBuf::from("cli_dir")],
            jobs: 2,
            ..Default::default()
        };
        let config = ProcessingConfigJson {
            input_path: Some("/config_dir".to_string()),
            jobs: Some(8),
            extensions: Some("png,apng".to_string()),
            ..Default::default()
        };

        args.merge_from_config(config, &cli(&["headshot-processor", "-i", "cli_dir", "--jobs=2"]));

        assert_eq!(args.input_paths, vec![PathBuf::from("cli_dir")]);
        assert_eq!(args.jobs, 2);
        assert_eq!(args.extensions_str, "png,apng");
    }

    #[test]
    fn test_load_missing_config_fails() {
        let mut args = Args {
            config_file: Some(PathBuf::from("/nonexistent/headshots.json")),
            ..Default::default()
        };
        assert!(args.load_and_merge_config().is_err());
    }
}
