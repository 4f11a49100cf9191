//! Run report export
//!
//! One row per discovered file, selected or not, written as an Excel workbook
//! (a single "Summary" sheet), as CSV, or as JSON with run metadata.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::cli::ReportFormat;
use crate::pipeline::{timestamped_file_name, FileOutcome, KmlFile, MergedDocument};

/// Name of the worksheet in the Excel report
pub const SUMMARY_SHEET: &str = "Summary";

/// Column headers shared by the CSV and Excel reports
pub const REPORT_HEADERS: [&str; 8] = [
    "File Name",
    "File Size (bytes)",
    "File Size (MB)",
    "Placemarks",
    "Included",
    "Status",
    "Merged Placemarks",
    "Error",
];

/// Merge status of a file as shown in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    Merged,
    Failed,
    NotSelected,
}

impl MergeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStatus::Merged => "merged",
            MergeStatus::Failed => "failed",
            MergeStatus::NotSelected => "not_selected",
        }
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "File Name")]
    pub file_name: String,
    #[serde(rename = "File Size (bytes)")]
    pub size_bytes: u64,
    #[serde(rename = "File Size (MB)")]
    pub size_mb: String,
    /// Count from discovery; empty when unknown
    #[serde(rename = "Placemarks")]
    pub placemarks: Option<usize>,
    #[serde(rename = "Included")]
    pub included: String,
    #[serde(rename = "Status")]
    pub status: MergeStatus,
    #[serde(rename = "Merged Placemarks")]
    pub merged_placemarks: Option<usize>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

/// Run metadata for the JSON report
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub tool_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    pub files_discovered: usize,
    pub files_selected: usize,
    pub files_merged: usize,
    pub files_failed: usize,
    pub total_placemarks: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: ReportMetadata,
    files: &'a [ReportRow],
}

/// Summary of one run, row per discovered file
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub rows: Vec<ReportRow>,
    pub output_file: Option<PathBuf>,
    pub total_placemarks: usize,
}

impl RunReport {
    /// Build the report from the discovered files and the merge result.
    pub fn build(files: &[KmlFile], merged: &MergedDocument, output_file: Option<&Path>) -> Self {
        let rows = files
            .iter()
            .map(|file| {
                let (status, merged_placemarks, error) = match merged.outcome_for(&file.path) {
                    Some(FileOutcome::Merged { placemarks }) => {
                        (MergeStatus::Merged, Some(*placemarks), None)
                    }
                    Some(FileOutcome::Failed { reason }) => {
                        (MergeStatus::Failed, None, Some(reason.clone()))
                    }
                    None => (MergeStatus::NotSelected, None, None),
                };
                ReportRow {
                    file_name: file.name.clone(),
                    size_bytes: file.size_bytes,
                    size_mb: format!("{:.2}", file.size_mb()),
                    placemarks: file.placemarks,
                    included: if file.included { "yes" } else { "no" }.to_string(),
                    status,
                    merged_placemarks,
                    error,
                }
            })
            .collect();

        Self {
            rows,
            output_file: output_file.map(Path::to_path_buf),
            total_placemarks: merged.placemark_count(),
        }
    }

    fn count_status(&self, status: MergeStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }

    /// Write the report into `dir` as `<timestamp>_[<label>_]Report.<ext>`.
    pub fn write(
        &self,
        dir: &Path,
        timestamp: &NaiveDateTime,
        label: Option<&str>,
        format: ReportFormat,
    ) -> Result<PathBuf> {
        let file_name =
            timestamped_file_name(timestamp, label, &format!("Report.{}", format.extension()));
        let path = dir.join(file_name);

        match format {
            ReportFormat::Xlsx => self.write_xlsx(&path)?,
            ReportFormat::Csv => self.write_csv(&path)?,
            ReportFormat::Json => self.write_json(&path, timestamp)?,
        }

        log::info!("Analysis saved as {}", path.display());
        Ok(path)
    }

    /// Write the rows to the "Summary" sheet of an Excel workbook
    pub fn write_xlsx(&self, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let size_format = Format::new().set_num_format("0.00");

        let sheet = workbook.add_worksheet();
        sheet.set_name(SUMMARY_SHEET)?;

        for (col, header) in REPORT_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (idx, row) in self.rows.iter().enumerate() {
            let r = idx as u32 + 1;
            sheet.write_string(r, 0, &row.file_name)?;
            sheet.write_number(r, 1, row.size_bytes as f64)?;
            sheet.write_number_with_format(r, 2, row.size_bytes as f64 / (1024.0 * 1024.0), &size_format)?;
            if let Some(count) = row.placemarks {
                sheet.write_number(r, 3, count as f64)?;
            }
            sheet.write_string(r, 4, &row.included)?;
            sheet.write_string(r, 5, row.status.as_str())?;
            if let Some(count) = row.merged_placemarks {
                sheet.write_number(r, 6, count as f64)?;
            }
            if let Some(error) = &row.error {
                sheet.write_string(r, 7, error)?;
            }
        }
        sheet.autofit();

        workbook
            .save(path)
            .with_context(|| format!("Failed to write report file: {}", path.display()))?;
        Ok(())
    }

    /// Write the rows as CSV
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        for row in &self.rows {
            writer
                .serialize(row)
                .with_context(|| format!("Failed to write report row for {}", row.file_name))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write report file: {}", path.display()))?;
        Ok(())
    }

    /// Write the rows and run metadata as pretty-printed JSON
    pub fn write_json(&self, path: &Path, timestamp: &NaiveDateTime) -> Result<()> {
        let report = JsonReport {
            metadata: ReportMetadata {
                timestamp: timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                output_file: self
                    .output_file
                    .as_ref()
                    .map(|p| p.display().to_string()),
                files_discovered: self.rows.len(),
                files_selected: self.rows.iter().filter(|r| r.included == "yes").count(),
                files_merged: self.count_status(MergeStatus::Merged),
                files_failed: self.count_status(MergeStatus::Failed),
                total_placemarks: self.total_placemarks,
            },
            files: &self.rows,
        };

        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("Failed to write report file: {}", path.display()))?;
        Ok(())
    }
}
