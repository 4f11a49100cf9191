//! Tests for KML file discovery and placemark counting

use std::fs;

use tempfile::TempDir;
use ufedkmlmerge::pipeline::{count_placemarks, discover_kml_files, KmlError};

mod common;

use common::{write_file, write_kml, write_malformed};

#[test]
fn test_discovers_kml_files_sorted_by_name() {
    let temp_dir = TempDir::new().unwrap();
    write_kml(temp_dir.path(), "Locations.kml", "loc", 4);
    write_kml(temp_dir.path(), "Example.kml", "ex", 2);
    write_file(temp_dir.path(), "notes.txt", "not a kml");
    write_file(temp_dir.path(), "archive.kmz", "zip");

    let files = discover_kml_files(temp_dir.path()).unwrap();

    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Example.kml", "Locations.kml"]);
    assert_eq!(files[0].placemarks, Some(2));
    assert_eq!(files[1].placemarks, Some(4));
    assert!(files.iter().all(|f| !f.included), "Nothing is included before selection");
}

#[test]
fn test_extension_match_ignores_case() {
    let temp_dir = TempDir::new().unwrap();
    write_kml(temp_dir.path(), "UPPER.KML", "u", 1);
    write_kml(temp_dir.path(), "mixed.Kml", "m", 1);

    let files = discover_kml_files(temp_dir.path()).unwrap();
    assert_eq!(files.len(), 2);
}

#[test]
fn test_directories_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("folder.kml")).unwrap();
    write_kml(temp_dir.path(), "real.kml", "r", 1);

    let files = discover_kml_files(temp_dir.path()).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "real.kml");
}

#[test]
fn test_records_file_size() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_kml(temp_dir.path(), "a.kml", "a", 3);
    let expected = fs::metadata(&path).unwrap().len();

    let files = discover_kml_files(temp_dir.path()).unwrap();
    assert_eq!(files[0].size_bytes, expected);
    assert_eq!(files[0].path, path);
}

#[test]
fn test_malformed_file_listed_with_unknown_count() {
    let temp_dir = TempDir::new().unwrap();
    write_malformed(temp_dir.path(), "broken.kml");
    write_kml(temp_dir.path(), "good.kml", "g", 5);

    let files = discover_kml_files(temp_dir.path()).unwrap();
    assert_eq!(files.len(), 2, "Malformed file must still be listed");
    assert_eq!(files[0].name, "broken.kml");
    assert_eq!(files[0].placemarks, None);
    assert_eq!(files[1].placemarks, Some(5));
}

#[test]
fn test_zero_placemark_file_is_listed() {
    let temp_dir = TempDir::new().unwrap();
    write_kml(temp_dir.path(), "empty.kml", "e", 0);

    let files = discover_kml_files(temp_dir.path()).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].placemarks, Some(0));
}

#[test]
fn test_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    assert!(discover_kml_files(temp_dir.path()).unwrap().is_empty());
}

#[test]
fn test_missing_directory_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = discover_kml_files(&temp_dir.path().join("does-not-exist"));
    assert!(result.is_err());
}

#[test]
fn test_count_prefixed_and_self_closing_placemarks() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "prefixed.kml",
        r#"<kml:kml xmlns:kml="http://www.opengis.net/kml/2.2">
  <kml:Document>
    <kml:Placemark><kml:name>one</kml:name></kml:Placemark>
    <kml:Placemark/>
    <kml:Folder><kml:Placemark><kml:name>three</kml:name></kml:Placemark></kml:Folder>
  </kml:Document>
</kml:kml>"#,
    );

    assert_eq!(count_placemarks(&path).unwrap(), 3);
}

#[test]
fn test_nested_placemark_counted_once() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "nested.kml",
        "<kml><Document><Placemark><Placemark/></Placemark><Placemark></Placemark></Document></kml>",
    );

    assert_eq!(count_placemarks(&path).unwrap(), 2);
}

#[test]
fn test_count_truncated_file_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_malformed(temp_dir.path(), "cut.kml");

    let err = count_placemarks(&path).unwrap_err();
    assert!(matches!(err, KmlError::Malformed { .. }), "got {:?}", err);
}

#[test]
fn test_count_mismatched_tags_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "mismatch.kml",
        "<kml><Document><Placemark></Document></Placemark></kml>",
    );

    assert!(matches!(
        count_placemarks(&path),
        Err(KmlError::Malformed { .. })
    ));
}

#[test]
fn test_count_empty_file_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(temp_dir.path(), "blank.kml", "");

    assert!(matches!(
        count_placemarks(&path),
        Err(KmlError::Malformed { .. })
    ));
}

#[test]
fn test_count_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = count_placemarks(&temp_dir.path().join("gone.kml"));
    assert!(matches!(result, Err(KmlError::Io { .. })), "got {:?}", result);
}
