use std::fs;

use simplereports::output::{write_result, CsvLineEnding, OutputError, OutputFormat, OutputOptions};
use simplereports::{CellValue, ResultSet};

fn sample() -> ResultSet {
    ResultSet::new(
        vec!["A".to_string(), "B".to_string()],
        vec![vec![CellValue::Integer(1), CellValue::Integer(2)]],
    )
}

fn written(format: OutputFormat, result: &ResultSet, options: &OutputOptions) -> String {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("out.{}", format.extension()));
    write_result(result, format, &path, options).unwrap();
    fs::read_to_string(&path).unwrap()
}

#[test]
fn test_csv_file() {
    let text = written(OutputFormat::Csv, &sample(), &OutputOptions::default());
    assert_eq!(text, "A,B\r\n1,2\r\n");
}

#[test]
fn test_csv_lf_line_ending() {
    let options = OutputOptions {
        csv_line_ending: CsvLineEnding::Lf,
        ..OutputOptions::default()
    };
    assert_eq!(written(OutputFormat::Csv, &sample(), &options), "A,B\n1,2\n");
}

#[test]
fn test_json_file() {
    let text = written(OutputFormat::Json, &sample(), &OutputOptions::default());
    assert_eq!(text, "[\n  {\n    \"A\": 1,\n    \"B\": 2\n  }\n]");
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, serde_json::json!([{"A": 1, "B": 2}]));
}

#[test]
fn test_json_indent_setting() {
    let options = OutputOptions {
        json_indent: 4,
        ..OutputOptions::default()
    };
    let text = written(OutputFormat::Json, &sample(), &options);
    assert!(text.contains("\n        \"A\": 1"));
}

#[test]
fn test_xml_file() {
    let result = ResultSet::new(
        vec!["count(*)".to_string(), "label".to_string()],
        vec![vec![CellValue::Integer(3), CellValue::from("a & b")]],
    );
    let text = written(OutputFormat::Xml, &result, &OutputOptions::default());
    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(text.contains("<count___>3</count___>"));
    assert!(text.contains("<label>a &amp; b</label>"));
    assert!(text.trim_end().ends_with("</result>"));
}

#[test]
fn test_existing_file_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    fs::write(&path, "stale contents that are much longer than the result\n").unwrap();

    write_result(&sample(), OutputFormat::Csv, &path, &OutputOptions::default()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "A,B\r\n1,2\r\n");
}

#[test]
fn test_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("out.json");
    let err = write_result(&sample(), OutputFormat::Json, &path, &OutputOptions::default())
        .unwrap_err();
    assert!(matches!(err, OutputError::Io(_)));
    assert!(!path.exists());
}

#[test]
fn test_empty_result_in_every_format() {
    let empty = ResultSet::default();
    let options = OutputOptions::default();
    assert_eq!(written(OutputFormat::Csv, &empty, &options), "");
    assert_eq!(written(OutputFormat::Json, &empty, &options), "[]");
    assert!(written(OutputFormat::Xml, &empty, &options).contains("<result>"));
}
