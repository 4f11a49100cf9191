//! UFEDKMLmerge: KML Merge Library
//!
//! Discovers KML files exported from UFED, lets the user pick a subset and
//! concatenates their placemarks into a single KML document, with an optional
//! run report.

pub mod app;
pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
