//! KML file discovery and streaming placemark count

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::error::KmlError;

/// Local element name of a KML placemark
pub const PLACEMARK_TAG: &[u8] = b"Placemark";

/// A candidate KML file found in the scanned directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmlFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    /// Placemark count from the discovery pass; `None` when the file could not be parsed
    pub placemarks: Option<usize>,
    /// Set once the user has picked this file for the merge
    pub included: bool,
}

impl KmlFile {
    /// Size in megabytes (as shown in listings and reports)
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Check whether a path has a `.kml` extension, ignoring case
pub fn is_kml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("kml"))
        .unwrap_or(false)
}

/// Scan `dir` for KML files and count the placemarks in each.
///
/// Files are returned sorted by name. A file that fails the count is still
/// listed, with `placemarks` set to `None`.
pub fn discover_kml_files(dir: &Path) -> Result<Vec<KmlFile>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && is_kml_path(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let size_bytes = fs::metadata(&path)
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?
            .len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let placemarks = match count_placemarks(&path) {
            Ok(count) => {
                log::info!("Found {} ({} bytes, {} placemarks)", name, size_bytes, count);
                Some(count)
            }
            Err(e) => {
                log::warn!("Could not count placemarks in {}: {}", name, e);
                None
            }
        };

        files.push(KmlFile {
            path,
            name,
            size_bytes,
            placemarks,
            included: false,
        });
    }

    Ok(files)
}

/// Count top-level placemarks in a KML file without building a tree.
///
/// Placemarks are matched by local name so prefixed (`kml:Placemark`) and
/// unprefixed elements both count. A placemark nested inside another is not
/// counted again. The whole file is read so truncated documents are reported
/// as malformed.
pub fn count_placemarks(path: &Path) -> Result<usize, KmlError> {
    let mut reader = Reader::from_file(path).map_err(|e| match e {
        quick_xml::Error::Io(io) => KmlError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(io.kind(), io.to_string()),
        },
        other => KmlError::Malformed {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })?;

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut placemark_depth = 0usize;
    let mut seen_root = false;
    let mut count = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| KmlError::Malformed {
            path: path.to_path_buf(),
            message: format!("{} (at byte {})", e, reader.buffer_position()),
        })?;

        match event {
            Event::Start(e) => {
                depth += 1;
                seen_root = true;
                if e.local_name().as_ref() == PLACEMARK_TAG {
                    if placemark_depth == 0 {
                        count += 1;
                    }
                    placemark_depth += 1;
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if e.local_name().as_ref() == PLACEMARK_TAG {
                    placemark_depth = placemark_depth.saturating_sub(1);
                }
            }
            Event::Empty(e) => {
                seen_root = true;
                if e.local_name().as_ref() == PLACEMARK_TAG && placemark_depth == 0 {
                    count += 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(KmlError::Malformed {
            path: path.to_path_buf(),
            message: "no root element".to_string(),
        });
    }
    if depth != 0 {
        return Err(KmlError::Malformed {
            path: path.to_path_buf(),
            message: format!("unexpected end of file with {} unclosed element(s)", depth),
        });
    }

    Ok(count)
}
