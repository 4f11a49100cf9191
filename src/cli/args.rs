//! Command-line argument definitions using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Default log file, created next to where the tool is run
pub const DEFAULT_LOG_FILE: &str = "UFEDKMLmerge.log";

/// UFEDKMLmerge - Merge KML files exported from UFED into one file
#[derive(Parser, Debug, Clone)]
#[command(name = "ufedkmlmerge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for KML files
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Directory for the merged KML and the report.
    /// Defaults to the scanned directory.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Files to merge, skipping the interactive prompt.
    /// Same syntax as the prompt: "all", "1,2", "3 1", "2-4".
    #[arg(short, long)]
    pub select: Option<String>,

    /// Label inserted into the output file name (<timestamp>_<label>_Merged.kml)
    #[arg(short, long)]
    pub label: Option<String>,

    /// Write the run report without asking
    #[arg(long, default_value = "false")]
    pub report: bool,

    /// Format of the run report
    #[arg(long, value_enum, default_value = "xlsx")]
    pub report_format: ReportFormat,

    /// Skip the label and report questions
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Log file (appended to, rotated when large)
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// How many invalid selections are allowed before giving up
    #[arg(long, default_value = "5", value_parser = validate_at_least_one)]
    pub max_attempts: usize,

    /// Minimum number of files a merge needs
    #[arg(long, default_value = "2", value_parser = validate_at_least_one)]
    pub min_files: usize,

    /// Also show informational log lines on the console
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,
}

/// Output format of the run report
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Excel workbook with a "Summary" sheet
    #[default]
    Xlsx,
    /// Comma-separated values
    Csv,
    /// JSON with run metadata
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

impl Cli {
    /// Directory where output files go
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| self.dir.clone())
    }

    /// Whether any question may be asked on the terminal
    pub fn is_interactive(&self) -> bool {
        !self.no_confirm
    }
}

/// Validator for counts that must be at least 1
fn validate_at_least_one(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value == 0 {
        Err("value must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
