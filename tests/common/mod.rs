//! Shared test utilities and fixture generators
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use ufedkmlmerge::cli::Cli;

pub const KML_NS: &str = "http://www.opengis.net/kml/2.2";

/// Build a UFED-style KML document with `count` placemarks named `<prefix>-<n>`
pub fn kml_with_placemarks(prefix: &str, count: usize) -> String {
    let mut kml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <kml xmlns=\"http://www.opengis.net/kml/2.2\">\n  <Document>\n    <name>Export</name>\n",
    );
    for i in 0..count {
        kml.push_str(&format!(
            "    <Placemark><name>{prefix}-{i}</name><Point><coordinates>{lon:.4},{lat:.4},0</coordinates></Point></Placemark>\n",
            prefix = prefix,
            i = i,
            lon = 13.0 + i as f64 * 0.0001,
            lat = 52.0 + i as f64 * 0.0001,
        ));
    }
    kml.push_str("  </Document>\n</kml>\n");
    kml
}

/// Write a file into `dir` and return its path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Write a generated KML file with `count` placemarks
pub fn write_kml(dir: &Path, name: &str, prefix: &str, count: usize) -> PathBuf {
    write_file(dir, name, &kml_with_placemarks(prefix, count))
}

/// A file that is not well-formed XML
pub fn write_malformed(dir: &Path, name: &str) -> PathBuf {
    write_file(
        dir,
        name,
        "<?xml version=\"1.0\"?>\n<kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document><Placemark><name>cut",
    )
}

/// Names of the placemarks in a KML document, in document order
pub fn placemark_names(kml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(kml).unwrap();
    doc.descendants()
        .filter(|n| n.has_tag_name((KML_NS, "Placemark")))
        .map(|p| {
            p.children()
                .find(|c| c.has_tag_name((KML_NS, "name")))
                .and_then(|c| c.text())
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

/// Number of `<Document>` elements and placemarks in a KML document
pub fn document_shape(kml: &str) -> (usize, usize) {
    let doc = roxmltree::Document::parse(kml).unwrap();
    let documents = doc
        .descendants()
        .filter(|n| n.has_tag_name((KML_NS, "Document")))
        .count();
    let placemarks = doc
        .descendants()
        .filter(|n| n.has_tag_name((KML_NS, "Placemark")))
        .count();
    (documents, placemarks)
}

/// Files currently in `dir` whose names end with `suffix`
pub fn files_ending_with(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(suffix))
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

/// Fixed clock for deterministic file names
pub fn fixed_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(14, 25, 30)
        .unwrap()
}

/// Parse a CLI pointed at `dir`, with extra flags appended
pub fn cli_for(dir: &Path, extra: &[&str]) -> Cli {
    let mut args = vec![
        "ufedkmlmerge".to_string(),
        "--dir".to_string(),
        dir.display().to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    Cli::parse_from(args)
}
