//! Output writer for the merged KML document
//!
//! The document is rendered to a temporary file in the target directory and
//! renamed into place, so a failed run never leaves a partial `.kml` behind.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::error::WriteError;
use super::merger::{MergedDocument, KML_NAMESPACE};

/// Timestamp prefix used for output and report file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Suffix of every merged output file
pub const MERGED_SUFFIX: &str = "Merged.kml";

/// Build `<timestamp>_[<label>_]<suffix>`
pub fn timestamped_file_name(timestamp: &NaiveDateTime, label: Option<&str>, suffix: &str) -> String {
    let stamp = timestamp.format(TIMESTAMP_FORMAT);
    match label {
        Some(label) if !label.is_empty() => format!("{}_{}_{}", stamp, label, suffix),
        _ => format!("{}_{}", stamp, suffix),
    }
}

/// Name of the merged output file, e.g. `20240315_142530_Case42_Merged.kml`
pub fn output_file_name(timestamp: &NaiveDateTime, label: Option<&str>) -> String {
    timestamped_file_name(timestamp, label, MERGED_SUFFIX)
}

/// Serialize the merged document.
///
/// `title` becomes the `<name>` of the single `<Document>`. Placemarks are
/// written verbatim, one per line.
pub fn render_merged_document(doc: &MergedDocument, title: &str) -> Result<Vec<u8>, WriteError> {
    let mut buf = Vec::new();
    write_document(&mut buf, doc, title)?;
    Ok(buf)
}

fn write_document<W: Write>(out: W, doc: &MergedDocument, title: &str) -> Result<(), WriteError> {
    let mut writer = Writer::new(out);
    let newline = |indent: &'static str| Event::Text(BytesText::from_escaped(indent));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(newline("\n"))?;

    let mut root = BytesStart::new("kml");
    root.push_attribute(("xmlns", KML_NAMESPACE));
    for (prefix, uri) in doc.namespaces() {
        let key = format!("xmlns:{}", prefix);
        root.push_attribute((key.as_str(), uri.as_str()));
    }
    writer.write_event(Event::Start(root))?;

    writer.write_event(newline("\n  "))?;
    writer.write_event(Event::Start(BytesStart::new("Document")))?;

    writer.write_event(newline("\n    "))?;
    writer.write_event(Event::Start(BytesStart::new("name")))?;
    writer.write_event(Event::Text(BytesText::new(title)))?;
    writer.write_event(Event::End(BytesEnd::new("name")))?;

    for placemark in doc.placemarks() {
        writer.write_event(newline("\n    "))?;
        writer.write_event(Event::Text(BytesText::from_escaped(placemark.as_str())))?;
    }

    writer.write_event(newline("\n  "))?;
    writer.write_event(Event::End(BytesEnd::new("Document")))?;
    writer.write_event(newline("\n"))?;
    writer.write_event(Event::End(BytesEnd::new("kml")))?;
    writer.write_event(newline("\n"))?;

    Ok(())
}

/// Write the merged document into `dir` and return the final path.
///
/// The file only appears under its final name once it is completely written.
/// An existing file with the same name is never overwritten.
pub fn write_merged_document(
    doc: &MergedDocument,
    dir: &Path,
    timestamp: &NaiveDateTime,
    label: Option<&str>,
) -> Result<PathBuf, WriteError> {
    let file_name = output_file_name(timestamp, label);
    let target = dir.join(&file_name);
    let title = file_name.trim_end_matches(".kml");

    if target.exists() {
        return Err(WriteError::Exists { path: target });
    }

    let mut tmp = tempfile::Builder::new()
        .prefix(".ufedkmlmerge-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|source| WriteError::Create {
            dir: dir.to_path_buf(),
            source,
        })?;

    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write_document(&mut out, doc, title)?;
        out.flush().map_err(|source| WriteError::Io {
            path: target.clone(),
            source,
        })?;
    }
    tmp.as_file().sync_all().map_err(|source| WriteError::Io {
        path: target.clone(),
        source,
    })?;

    // Dropping the temp file on any error above removes it.
    tmp.persist_noclobber(&target).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            WriteError::Exists {
                path: target.clone(),
            }
        } else {
            WriteError::Io {
                path: target.clone(),
                source: e.error,
            }
        }
    })?;

    log::info!("Merged KML file saved as {}", target.display());
    Ok(target)
}
