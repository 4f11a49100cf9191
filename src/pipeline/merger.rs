//! KML merger - structural concatenation of placemarks
//!
//! Each selected file is parsed into a tree, its `<Placemark>` elements are
//! located, and their exact source text is appended to a single
//! [`MergedDocument`]. Placemark content is never rewritten: coordinates,
//! styles and extended data pass through byte for byte, and duplicates across
//! files stay duplicated.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use roxmltree::{Document, Node};

use super::discovery::KmlFile;
use super::error::KmlError;

/// Namespace of KML 2.2, used as the default namespace of the merged output
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

const PLACEMARK: &str = "Placemark";
const KML_ROOT: &str = "kml";
const DOCUMENT: &str = "Document";

/// One placemark subtree, held as the verbatim text of its element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placemark(String);

impl Placemark {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Placemarks and prefixed namespace declarations taken from one source file
#[derive(Debug, Clone, Default)]
pub struct ExtractedPlacemarks {
    pub placemarks: Vec<Placemark>,
    /// `(prefix, uri)` pairs in scope for the placemarks, in first-seen order
    pub namespaces: Vec<(String, String)>,
}

/// What happened to one selected file during the merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Merged { placemarks: usize },
    Failed { reason: String },
}

/// Merge result for one selected source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub path: PathBuf,
    pub name: String,
    pub outcome: FileOutcome,
}

/// The accumulating merged document
#[derive(Debug, Clone, Default)]
pub struct MergedDocument {
    placemarks: Vec<Placemark>,
    namespaces: BTreeMap<String, String>,
    sources: Vec<SourceOutcome>,
}

impl MergedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append everything extracted from `file`, in source order.
    pub fn append(&mut self, file: &KmlFile, extracted: ExtractedPlacemarks) {
        for (prefix, uri) in extracted.namespaces {
            match self.namespaces.get(&prefix) {
                Some(existing) if *existing != uri => {
                    log::warn!(
                        "Namespace prefix '{}' in {} maps to {}, keeping {}",
                        prefix,
                        file.name,
                        uri,
                        existing
                    );
                }
                Some(_) => {}
                None => {
                    self.namespaces.insert(prefix, uri);
                }
            }
        }

        self.sources.push(SourceOutcome {
            path: file.path.clone(),
            name: file.name.clone(),
            outcome: FileOutcome::Merged {
                placemarks: extracted.placemarks.len(),
            },
        });
        self.placemarks.extend(extracted.placemarks);
    }

    /// Record a file that could not be merged.
    pub fn record_failure(&mut self, file: &KmlFile, error: &KmlError) {
        self.sources.push(SourceOutcome {
            path: file.path.clone(),
            name: file.name.clone(),
            outcome: FileOutcome::Failed {
                reason: error.to_string(),
            },
        });
    }

    pub fn placemarks(&self) -> &[Placemark] {
        &self.placemarks
    }

    pub fn placemark_count(&self) -> usize {
        self.placemarks.len()
    }

    /// Prefixed namespace declarations needed by the placemarks, sorted by prefix
    pub fn namespaces(&self) -> &BTreeMap<String, String> {
        &self.namespaces
    }

    /// Per-file outcomes, in merge order
    pub fn sources(&self) -> &[SourceOutcome] {
        &self.sources
    }

    pub fn merged_file_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, FileOutcome::Merged { .. }))
            .count()
    }

    pub fn failed_file_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, FileOutcome::Failed { .. }))
            .count()
    }

    /// Outcome for a given source path, if it was part of the merge
    pub fn outcome_for(&self, path: &Path) -> Option<&FileOutcome> {
        self.sources
            .iter()
            .find(|s| s.path == path)
            .map(|s| &s.outcome)
    }
}

/// Merge the given files, in order, into one document.
///
/// Files that fail to parse are logged, recorded as failed and skipped.
pub fn merge_kml_files(files: &[KmlFile]) -> MergedDocument {
    merge_kml_files_with_progress(files, &ProgressBar::hidden())
}

/// Same as [`merge_kml_files`], advancing `pb` once per file.
pub fn merge_kml_files_with_progress(files: &[KmlFile], pb: &ProgressBar) -> MergedDocument {
    let mut merged = MergedDocument::new();

    for file in files {
        pb.set_message(file.name.clone());
        match extract_placemarks(&file.path) {
            Ok(extracted) => {
                log::info!(
                    "File {} successfully merged with {} placemarks",
                    file.name,
                    extracted.placemarks.len()
                );
                merged.append(file, extracted);
            }
            Err(e) => {
                log::error!("Failed to merge file {}: {}", file.name, e);
                merged.record_failure(file, &e);
            }
        }
        pb.inc(1);
    }

    merged
}

/// Read a KML file and extract its placemarks.
pub fn extract_placemarks(path: &Path) -> Result<ExtractedPlacemarks, KmlError> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::InvalidData {
            KmlError::Malformed {
                path: path.to_path_buf(),
                message: "file is not valid UTF-8".to_string(),
            }
        } else {
            KmlError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    extract_placemarks_from_str(path, &text)
}

/// Extract placemarks from KML text; `path` is only used in errors.
pub fn extract_placemarks_from_str(path: &Path, text: &str) -> Result<ExtractedPlacemarks, KmlError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let doc = Document::parse(text).map_err(|e| KmlError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != KML_ROOT {
        return Err(KmlError::NotKml {
            path: path.to_path_buf(),
            root: root.tag_name().name().to_string(),
        });
    }
    let has_document = root
        .descendants()
        .any(|n| n.is_element() && n.tag_name().name() == DOCUMENT);
    if !has_document {
        return Err(KmlError::MissingDocument {
            path: path.to_path_buf(),
        });
    }

    let mut nodes = Vec::new();
    collect_placemarks(root, &mut nodes);

    let mut extracted = ExtractedPlacemarks::default();
    for node in nodes {
        extracted
            .placemarks
            .push(Placemark(text[node.range()].to_string()));

        for ns in node.namespaces() {
            let Some(prefix) = ns.name() else { continue };
            if prefix == "xml" {
                continue;
            }
            if !extracted.namespaces.iter().any(|(p, _)| p == prefix) {
                extracted
                    .namespaces
                    .push((prefix.to_string(), ns.uri().to_string()));
            }
        }
    }

    Ok(extracted)
}

/// Depth-first walk collecting placemark elements without entering them
fn collect_placemarks<'a, 'input>(node: Node<'a, 'input>, out: &mut Vec<Node<'a, 'input>>) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == PLACEMARK {
            out.push(child);
        } else {
            collect_placemarks(child, out);
        }
    }
}
