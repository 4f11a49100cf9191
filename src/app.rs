//! Run orchestration: discovery, selection, merge, output and report
//!
//! `run` is the whole tool minus process setup. Input comes from a
//! [`LineInput`] and the clock is passed in, so complete runs can be driven
//! from tests.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;

use crate::cli::{
    check_minimum, confirm_report, parse_selection, prompt_label, prompt_selection,
    sanitize_label, Cli, LineInput, Selection, SelectionOutcome,
};
use crate::pipeline::{discover_kml_files, merge_kml_files_with_progress, write_merged_document, KmlFile};
use crate::report::{MergeSummary, RunReport};
use crate::utils::{
    create_progress_bar, finish_with_success, finish_with_warning, format_size, print_count,
    print_error, print_info, print_step_header, print_success, print_warning,
};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No `.kml` files in the scanned directory
    NoFilesFound,
    /// Fewer files than a merge needs
    NotEnoughFiles { found: usize, required: usize },
    /// User chose to exit at the prompt
    Exited,
    /// No valid selection within the allowed attempts
    NothingSelected,
    /// Every selected file parsed but none contained placemarks
    NothingMerged,
    /// Merged output written
    Completed {
        output: PathBuf,
        report: Option<PathBuf>,
        placemarks: usize,
        failed_files: usize,
    },
}

/// Execute one complete run.
pub fn run(cli: &Cli, input: &mut dyn LineInput, now: NaiveDateTime) -> Result<RunOutcome> {
    let output_dir = cli.output_dir();

    // Step 1: discovery
    print_step_header(1, "Discover KML Files");
    let mut files = discover_kml_files(&cli.dir)?;
    if files.is_empty() {
        log::info!("No KML files found in {}", cli.dir.display());
        print_info("No KML files found in the scanned directory.");
        return Ok(RunOutcome::NoFilesFound);
    }
    print_count("KML file(s)", files.len());
    let unknown = files.iter().filter(|f| f.placemarks.is_none()).count();
    if unknown > 0 {
        print_warning(&format!(
            "{} file(s) could not be read; placemark count unknown",
            unknown
        ));
    }
    if files.len() < cli.min_files {
        log::info!(
            "Found {} KML file(s), at least {} required for a merge",
            files.len(),
            cli.min_files
        );
        print_info(&format!(
            "At least {} KML files are required to perform a merge.",
            cli.min_files
        ));
        return Ok(RunOutcome::NotEnoughFiles {
            found: files.len(),
            required: cli.min_files,
        });
    }

    // Step 2: selection
    print_step_header(2, "Select Files");
    let indices = match select_files(cli, &files, input)? {
        SelectionOutcome::Selected(indices) => indices,
        SelectionOutcome::Exit => {
            print_info("Exiting. No files were written.");
            return Ok(RunOutcome::Exited);
        }
        SelectionOutcome::Exhausted => {
            print_warning("No valid selection made. No files were written.");
            return Ok(RunOutcome::NothingSelected);
        }
    };
    for &idx in &indices {
        files[idx].included = true;
    }
    let selected: Vec<KmlFile> = indices.iter().map(|&idx| files[idx].clone()).collect();
    for file in &selected {
        log::info!("Selected {}", file.name);
    }

    let label = match &cli.label {
        Some(raw) => sanitize_label(raw),
        None if cli.is_interactive() => prompt_label(input)?,
        None => None,
    };

    // Step 3: merge
    print_step_header(3, "Merge Placemarks");
    let pb = create_progress_bar(selected.len() as u64, "Merging");
    let merged = merge_kml_files_with_progress(&selected, &pb);
    if merged.failed_file_count() == 0 {
        finish_with_success(&pb, "All files merged");
    } else {
        finish_with_warning(
            &pb,
            &format!("{} file(s) skipped", merged.failed_file_count()),
        );
    }
    print_info(&format!("{} placemark(s) merged", merged.placemark_count()));

    let mut summary = MergeSummary::new(files.len(), &merged);

    if merged.placemark_count() == 0 {
        summary.display();
        if merged.failed_file_count() > 0 {
            log::error!("No valid KML files were merged");
            bail!("No valid KML files were merged");
        }
        log::warn!("Selected files contain no placemarks; no output written");
        print_warning("Selected files contain no placemarks. No output written.");
        return Ok(RunOutcome::NothingMerged);
    }

    // Step 4: output
    print_step_header(4, "Save Results");
    let output = match write_merged_document(&merged, &output_dir, &now, label.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            log::error!("Failed to write merged KML: {}", e);
            print_error(&format!("Failed to write merged KML: {}", e));
            return Err(e).context("Merged KML could not be written");
        }
    };
    print_success(&format!(
        "Merged KML file saved as: {} ({})",
        output.display(),
        std::fs::metadata(&output)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "size unknown".to_string())
    ));
    summary.set_output_file(output.clone());
    summary.display();

    // Step 5: report
    let want_report = cli.report || (cli.is_interactive() && confirm_report(input)?);
    let report = if want_report {
        print_step_header(5, "Run Report");
        let run_report = RunReport::build(&files, &merged, Some(&output));
        match run_report.write(&output_dir, &now, label.as_deref(), cli.report_format) {
            Ok(path) => {
                print_success(&format!("Analysis saved as {}", path.display()));
                Some(path)
            }
            Err(e) => {
                log::warn!("Failed to write report: {:#}", e);
                print_warning(&format!("Report could not be written: {:#}", e));
                None
            }
        }
    } else {
        None
    };

    log::info!(
        "{} file(s) merged into {} ({} placemarks)",
        merged.merged_file_count(),
        output.display(),
        merged.placemark_count()
    );

    Ok(RunOutcome::Completed {
        output,
        report,
        placemarks: merged.placemark_count(),
        failed_files: merged.failed_file_count(),
    })
}

/// Selection from `--select`, or the interactive prompt
fn select_files(cli: &Cli, files: &[KmlFile], input: &mut dyn LineInput) -> Result<SelectionOutcome> {
    match &cli.select {
        Some(raw) => {
            let selection = parse_selection(raw, files.len())
                .with_context(|| format!("Invalid --select value '{}'", raw))?;
            if selection == Selection::Exit {
                log::info!("Exit requested via --select");
                return Ok(SelectionOutcome::Exit);
            }
            let indices = selection.resolve(files.len());
            check_minimum(&indices, cli.min_files)
                .with_context(|| format!("Invalid --select value '{}'", raw))?;
            log::info!("{} files selected for merging", indices.len());
            Ok(SelectionOutcome::Selected(indices))
        }
        None => {
            let mut stdout = io::stdout();
            prompt_selection(files, input, &mut stdout, cli.max_attempts, cli.min_files)
        }
    }
}
