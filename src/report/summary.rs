//! Merge summary shown on the console at the end of a run

use std::path::PathBuf;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{FileOutcome, MergedDocument, SourceOutcome};

/// Summary of the merge
#[derive(Debug, Default)]
pub struct MergeSummary {
    pub files_discovered: usize,
    pub sources: Vec<SourceOutcome>,
    pub total_placemarks: usize,
    pub output_file: Option<PathBuf>,
}

impl MergeSummary {
    pub fn new(files_discovered: usize, merged: &MergedDocument) -> Self {
        Self {
            files_discovered,
            sources: merged.sources().to_vec(),
            total_placemarks: merged.placemark_count(),
            output_file: None,
        }
    }

    pub fn set_output_file(&mut self, path: PathBuf) {
        self.output_file = Some(path);
    }

    pub fn files_merged(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, FileOutcome::Merged { .. }))
            .count()
    }

    pub fn files_failed(&self) -> usize {
        self.sources.len() - self.files_merged()
    }

    /// Per-file table, in merge order
    pub fn file_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("File").add_attribute(Attribute::Bold),
            Cell::new("Placemarks").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

        for (idx, source) in self.sources.iter().enumerate() {
            let (count, status) = match &source.outcome {
                FileOutcome::Merged { placemarks } => (
                    Cell::new(placemarks),
                    Cell::new("merged").fg(Color::Green),
                ),
                FileOutcome::Failed { .. } => (
                    Cell::new("-"),
                    Cell::new("failed").fg(Color::Red),
                ),
            };
            table.add_row(vec![Cell::new(idx + 1), Cell::new(&source.name), count, status]);
        }

        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("MERGE SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("📁 Files Found"),
            Cell::new(self.files_discovered),
        ]);
        table.add_row(vec![
            Cell::new("✅ Files Merged"),
            Cell::new(self.files_merged()).fg(Color::Green),
        ]);
        table.add_row(vec![
            Cell::new("❌ Files Failed"),
            Cell::new(self.files_failed()).fg(if self.files_failed() == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("📍 Placemarks"),
            Cell::new(self.total_placemarks)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        if let Some(output) = &self.output_file {
            table.add_row(vec![
                Cell::new("💾 Output"),
                Cell::new(output.display().to_string()),
            ]);
        }

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if !self.sources.is_empty() {
            println!();
            for line in self.file_table().to_string().lines() {
                println!("    {}", line);
            }
        }

        let failures: Vec<_> = self
            .sources
            .iter()
            .filter_map(|s| match &s.outcome {
                FileOutcome::Failed { reason } => Some(reason),
                FileOutcome::Merged { .. } => None,
            })
            .collect();
        if !failures.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Skipped files").yellow(),
                style(format!("({})", failures.len())).dim()
            );
            for reason in failures {
                println!("        {} {}", style("•").dim(), reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, outcome: FileOutcome) -> SourceOutcome {
        SourceOutcome {
            path: PathBuf::from(name),
            name: name.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_counts() {
        let summary = MergeSummary {
            files_discovered: 4,
            sources: vec![
                source("a.kml", FileOutcome::Merged { placemarks: 3 }),
                source(
                    "b.kml",
                    FileOutcome::Failed {
                        reason: "bad".to_string(),
                    },
                ),
                source("c.kml", FileOutcome::Merged { placemarks: 0 }),
            ],
            total_placemarks: 3,
            output_file: None,
        };
        assert_eq!(summary.files_merged(), 2);
        assert_eq!(summary.files_failed(), 1);
    }

    #[test]
    fn test_file_table_lists_sources_in_order() {
        let summary = MergeSummary {
            files_discovered: 2,
            sources: vec![
                source("second.kml", FileOutcome::Merged { placemarks: 7 }),
                source("first.kml", FileOutcome::Merged { placemarks: 1 }),
            ],
            total_placemarks: 8,
            output_file: None,
        };
        let rendered = summary.file_table().to_string();
        let second = rendered.find("second.kml").unwrap();
        let first = rendered.find("first.kml").unwrap();
        assert!(second < first);
    }
}
