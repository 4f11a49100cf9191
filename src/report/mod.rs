//! Report module - run report export and console summary

pub mod run_report;
pub mod summary;

pub use run_report::*;
pub use summary::*;
