//! Tests for the run report export

use std::fs;

use calamine::{open_workbook, Data, Reader, Xlsx};
use tempfile::TempDir;
use ufedkmlmerge::cli::ReportFormat;
use ufedkmlmerge::pipeline::{discover_kml_files, merge_kml_files, KmlFile};
use ufedkmlmerge::report::{MergeStatus, RunReport, REPORT_HEADERS, SUMMARY_SHEET};

mod common;

use common::{fixed_timestamp, write_kml, write_malformed};

/// a.kml and c.kml selected (c first), b.kml malformed and selected, d.kml left out
fn report_fixture(temp_dir: &TempDir) -> RunReport {
    write_kml(temp_dir.path(), "a.kml", "a", 2);
    write_malformed(temp_dir.path(), "b.kml");
    write_kml(temp_dir.path(), "c.kml", "c", 4);
    write_kml(temp_dir.path(), "d.kml", "d", 1);

    let mut files = discover_kml_files(temp_dir.path()).unwrap();
    for idx in [2, 0, 1] {
        files[idx].included = true;
    }
    let selected: Vec<KmlFile> = [2, 0, 1].iter().map(|&i| files[i].clone()).collect();
    let merged = merge_kml_files(&selected);
    RunReport::build(&files, &merged, None)
}

#[test]
fn test_one_row_per_discovered_file() {
    let temp_dir = TempDir::new().unwrap();
    let report = report_fixture(&temp_dir);

    let names: Vec<&str> = report.rows.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.kml", "b.kml", "c.kml", "d.kml"]);
    assert_eq!(report.total_placemarks, 6);
}

#[test]
fn test_row_status_and_counts() {
    let temp_dir = TempDir::new().unwrap();
    let report = report_fixture(&temp_dir);

    let a = &report.rows[0];
    assert_eq!(a.status, MergeStatus::Merged);
    assert_eq!(a.placemarks, Some(2));
    assert_eq!(a.merged_placemarks, Some(2));
    assert_eq!(a.included, "yes");

    let b = &report.rows[1];
    assert_eq!(b.status, MergeStatus::Failed);
    assert_eq!(b.placemarks, None);
    assert!(b.error.is_some());

    let d = &report.rows[3];
    assert_eq!(d.status, MergeStatus::NotSelected);
    assert_eq!(d.included, "no");
    assert_eq!(d.merged_placemarks, None);
}

#[test]
fn test_csv_report() {
    let temp_dir = TempDir::new().unwrap();
    let report = report_fixture(&temp_dir);
    let out_dir = TempDir::new().unwrap();

    let path = report
        .write(out_dir.path(), &fixed_timestamp(), Some("Case42"), ReportFormat::Csv)
        .unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "20240315_142530_Case42_Report.csv"
    );
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "File Name,File Size (bytes),File Size (MB),Placemarks,Included,Status,Merged Placemarks,Error"
    );
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("a.kml,"));
    assert!(lines[1].contains(",2,yes,merged,2,"));
    assert!(lines[4].contains(",1,no,not_selected,,"));
}

#[test]
fn test_xlsx_report_has_summary_sheet() {
    let temp_dir = TempDir::new().unwrap();
    let report = report_fixture(&temp_dir);
    let out_dir = TempDir::new().unwrap();

    let path = report
        .write(out_dir.path(), &fixed_timestamp(), None, ReportFormat::Xlsx)
        .unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "20240315_142530_Report.xlsx"
    );
    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec![SUMMARY_SHEET.to_string()]);

    let range = workbook.worksheet_range(SUMMARY_SHEET).unwrap();
    assert_eq!(range.height(), 5, "Header plus one row per discovered file");
    for (col, header) in REPORT_HEADERS.iter().enumerate() {
        assert_eq!(
            range.get((0, col)),
            Some(&Data::String(header.to_string()))
        );
    }
    assert_eq!(range.get((1, 0)), Some(&Data::String("a.kml".to_string())));
    assert_eq!(range.get((1, 6)), Some(&Data::Float(2.0)));
    assert_eq!(range.get((2, 5)), Some(&Data::String("failed".to_string())));
    assert_eq!(range.get((4, 4)), Some(&Data::String("no".to_string())));
    assert_eq!(
        range.get((4, 5)),
        Some(&Data::String("not_selected".to_string()))
    );
}

#[test]
fn test_json_report() {
    let temp_dir = TempDir::new().unwrap();
    let report = report_fixture(&temp_dir);
    let out_dir = TempDir::new().unwrap();

    let path = report
        .write(out_dir.path(), &fixed_timestamp(), None, ReportFormat::Json)
        .unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "20240315_142530_Report.json"
    );
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["metadata"]["files_discovered"], 4);
    assert_eq!(json["metadata"]["files_selected"], 3);
    assert_eq!(json["metadata"]["files_merged"], 2);
    assert_eq!(json["metadata"]["files_failed"], 1);
    assert_eq!(json["metadata"]["total_placemarks"], 6);
    assert_eq!(json["metadata"]["timestamp"], "2024-03-15T14:25:30");
    assert_eq!(json["files"][2]["Status"], "merged");
    assert_eq!(json["files"][2]["Merged Placemarks"], 4);
}

#[test]
fn test_report_write_failure_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let report = report_fixture(&temp_dir);

    let result = report.write(
        &temp_dir.path().join("missing"),
        &fixed_timestamp(),
        None,
        ReportFormat::Csv,
    );
    assert!(result.is_err());
}
