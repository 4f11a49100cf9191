//! UFEDKMLmerge: KML Merge CLI Tool
//!
//! Merges several KML files exported from UFED into one file.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use log::LevelFilter;

use ufedkmlmerge::app::{run, RunOutcome};
use ufedkmlmerge::cli::{Cli, TerminalInput};
use ufedkmlmerge::utils::{init_logging, print_banner, print_completion, print_config, print_warning};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let console_level = if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    if let Err(e) = init_logging(&cli.log_file, console_level) {
        print_warning(&format!("Logging to file disabled: {:#}", e));
    }

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&cli.dir, &cli.output_dir(), &cli.log_file);

    let mut input = TerminalInput;
    let outcome = run(&cli, &mut input, Local::now().naive_local()).map_err(|e| {
        log::error!("Run failed: {:#}", e);
        e
    })?;

    match outcome {
        RunOutcome::Completed { output, .. } => {
            println!();
            println!("    Output: {}", output.display());
            print_completion();
        }
        RunOutcome::Exited => log::info!("User exited before merging; no output written"),
        other => log::info!("Run finished without output: {:?}", other),
    }

    Ok(())
}
