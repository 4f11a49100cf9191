//! CLI module - argument parsing, selection syntax and interactive prompts

pub mod args;
pub mod prompts;
pub mod selection;

pub use args::{Cli, ReportFormat, DEFAULT_LOG_FILE};
pub use prompts::*;
pub use selection::*;
