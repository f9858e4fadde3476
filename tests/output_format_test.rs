//! Tests for the JSON and SARIF output formats.

use std::path::PathBuf;

use exhauststruct::detect::{CheckResult, Runner};
use exhauststruct::report::{self, JsonReport, SarifReport};
use exhauststruct::Config;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn run_testdata() -> CheckResult {
    exhauststruct::init();
    Runner::new(testdata_path(), Config::default())
        .run()
        .expect("check should succeed")
}

#[test]
fn test_json_report_structure() {
    let result = run_testdata();
    let report = report::json_report("testdata", &result);

    assert!(!report.version.is_empty(), "version should not be empty");
    assert_eq!(report.path, "testdata");
    assert!(!report.passed, "testdata has incomplete literals");
    assert_eq!(report.units_analyzed, 3);
    assert_eq!(report.files_scanned, result.scanned);
    assert_eq!(report.facts_published, 6);
    assert_eq!(report.diagnostics.len(), result.diagnostics.len());
    assert_eq!(report.suppressed_count, 1);
}

#[test]
fn test_json_diagnostics_format() {
    let result = run_testdata();
    let report = report::json_report("testdata", &result);

    for d in &report.diagnostics {
        assert_eq!(d.analyzer, "exhauststruct");
        assert!(!d.file.is_empty(), "file should not be empty");
        assert!(d.line > 0, "line should be 1-based");
        assert!(d.column > 0, "column should be 1-based");
        assert!(
            d.message.starts_with("uninitialized struct fields: "),
            "unexpected message: {}",
            d.message
        );
    }
}

#[test]
fn test_json_serialization() {
    let result = run_testdata();
    let json = report::render_json("testdata", &result).expect("should render JSON");

    let value: serde_json::Value = serde_json::from_str(&json).expect("should be valid JSON");
    assert_eq!(value["suppressed"][0]["suppression"]["type"], "nextline");
    assert_eq!(
        value["suppressed"][0]["suppression"]["reason"],
        "zero origin is intended"
    );

    let parsed: JsonReport = serde_json::from_str(&json).expect("should deserialize from JSON");
    assert_eq!(parsed.diagnostics.len(), result.diagnostics.len());
    assert_eq!(parsed.suppressed.len(), 1);
}

#[test]
fn test_sarif_format() {
    let result = run_testdata();
    let sarif = report::render_sarif(&result).expect("should render SARIF");

    let value: serde_json::Value = serde_json::from_str(&sarif).expect("should be valid JSON");
    assert_eq!(value["version"], "2.1.0");
    assert!(value["$schema"].as_str().unwrap().contains("sarif-schema-2.1.0"));

    let parsed: SarifReport = serde_json::from_str(&sarif).expect("should deserialize SARIF");
    let run = &parsed.runs[0];
    assert_eq!(run.tool.driver.name, "exhauststruct");
    assert_eq!(run.tool.driver.rules.len(), 1);
    assert_eq!(run.tool.driver.rules[0].id, "exhauststruct");
    assert_eq!(run.results.len(), result.diagnostics.len());

    let first = &run.results[0];
    assert_eq!(first.rule_id, "exhauststruct");
    assert_eq!(first.level, "error");
    assert_eq!(
        first.locations[0].physical_location.artifact_location.uri,
        "app/dot.go"
    );
    assert_eq!(first.locations[0].physical_location.region.start_line, 6);
    assert_eq!(first.locations[0].physical_location.region.start_column, 9);
}

#[test]
fn test_clean_result_passes() {
    let result = CheckResult::new();
    let report = report::json_report(".", &result);
    assert!(report.passed);
    assert!(report.diagnostics.is_empty());

    let json = report::render_json(".", &result).unwrap();
    assert!(!json.contains("\"suppressed\":"), "empty suppressed list is omitted");
}
