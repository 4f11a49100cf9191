//! Process-wide logging to a log file and the terminal
//!
//! Components log through the `log` macros only. `init_logging` installs the
//! sinks once at startup; when nothing is installed (tests, library use) the
//! macros are no-ops.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Rotate the log file once it grows past this size
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;

/// Rotated generations kept next to the log file (`.1` is the newest)
pub const LOG_GENERATIONS: usize = 3;

/// Install the file and terminal loggers.
///
/// The file always records `Info` and above. `console_level` controls what is
/// echoed on the terminal. If the log file cannot be opened the terminal
/// logger is still installed and the error is returned for the caller to report.
pub fn init_logging(log_file: &Path, console_level: LevelFilter) -> Result<()> {
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        console_level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    let file = rotate_if_needed(log_file, MAX_LOG_BYTES, LOG_GENERATIONS)
        .and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
        })
        .with_context(|| format!("Failed to open log file: {}", log_file.display()));

    let file_error = match file {
        Ok(file) => {
            loggers.push(WriteLogger::new(LevelFilter::Info, config, file));
            None
        }
        Err(e) => Some(e),
    };

    CombinedLogger::init(loggers).context("Logger already initialized")?;

    match file_error {
        Some(e) => Err(e),
        None => {
            log::info!("Logging configured successfully");
            Ok(())
        }
    }
}

/// Shift `path` to `path.1` (and older generations up by one) when it exceeds `max_bytes`.
///
/// Returns `true` if a rotation happened.
pub fn rotate_if_needed(path: &Path, max_bytes: u64, generations: usize) -> io::Result<bool> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if size <= max_bytes || generations == 0 {
        return Ok(false);
    }

    let oldest = generation_path(path, generations);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..generations).rev() {
        let from = generation_path(path, n);
        if from.exists() {
            fs::rename(&from, generation_path(path, n + 1))?;
        }
    }
    fs::rename(path, generation_path(path, 1))?;

    Ok(true)
}

/// `UFEDKMLmerge.log` -> `UFEDKMLmerge.log.<n>`
pub fn generation_path(path: &Path, n: usize) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}
