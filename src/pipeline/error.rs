//! Error types for reading and writing KML files.
//!
//! `KmlError` covers everything that can go wrong with a single source file
//! (discovery count or merge extraction). Those errors are always local to the
//! file: callers log them and move on. `WriteError` covers the merged output
//! and is fatal for the run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading a source KML file.
#[derive(Debug, Error)]
pub enum KmlError {
    /// The file could not be opened or read.
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not well-formed XML (or not valid UTF-8).
    #[error("{} is not well-formed XML: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    /// The document root is something other than `<kml>`.
    #[error("{} has root element <{root}>, expected <kml>", .path.display())]
    NotKml { path: PathBuf, root: String },

    /// The `<kml>` root has no `<Document>` container.
    #[error("{} has no <Document> container", .path.display())]
    MissingDocument { path: PathBuf },
}

impl KmlError {
    /// Path of the file the error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            KmlError::Io { path, .. }
            | KmlError::Malformed { path, .. }
            | KmlError::NotKml { path, .. }
            | KmlError::MissingDocument { path } => path,
        }
    }
}

/// Errors that can occur when writing the merged KML file.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The temporary output file could not be created in the target directory.
    #[error("Failed to create output file in {}: {source}", .dir.display())]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The XML writer failed.
    #[error("Failed to serialize merged KML: {0}")]
    Serialize(#[from] quick_xml::Error),

    /// Writing, flushing or renaming the output failed.
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file with the generated name is already present.
    #[error("Output file {} already exists", .path.display())]
    Exists { path: PathBuf },
}
