//! Integration tests for the full check pipeline.
//!
//! These tests run the analyzer against the Go module under testdata and
//! against scratch modules, checking which literals are flagged.

use std::fs;
use std::path::{Path, PathBuf};

use exhauststruct::analysis::{AnalysisContext, Diagnostic, FactStore, Pass, SymbolKey, Unit};
use exhauststruct::detect::{CheckResult, Runner, ANALYZER};
use exhauststruct::Config;
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn run_testdata(config: Config) -> CheckResult {
    exhauststruct::init();
    Runner::new(testdata_path(), config)
        .run()
        .expect("check should succeed")
}

/// (file, line, col, message) of every diagnostic.
fn findings(diagnostics: &[Diagnostic]) -> Vec<(String, usize, usize, String)> {
    diagnostics
        .iter()
        .map(|d| {
            (
                d.file.clone(),
                d.span.start_line,
                d.span.start_col,
                d.message.clone(),
            )
        })
        .collect()
}

fn finding(file: &str, line: usize, col: usize, missing: &str) -> (String, usize, usize, String) {
    (
        file.to_string(),
        line,
        col,
        format!("uninitialized struct fields: {}", missing),
    )
}

#[test]
fn test_testdata_diagnostics() {
    let result = run_testdata(Config::default());

    assert_eq!(
        findings(&result.diagnostics),
        vec![
            finding("app/dot.go", 6, 9, "Y"),
            finding("app/local.go", 11, 36, "name"),
            finding("app/local.go", 20, 10, "Min"),
            finding("app/main.go", 18, 7, "Y"),
            finding("app/main.go", 23, 10, "Verbose, Limit"),
            finding("app/main.go", 24, 38, "X"),
            finding("app/vendored.go", 9, 6, "B"),
            finding("app/vendored.go", 10, 6, "Y"),
            finding("shapes/shapes.go", 40, 9, "Y"),
            finding("shapes/shapes.go", 45, 9, "Second"),
        ]
    );
}

#[test]
fn test_testdata_counts() {
    let result = run_testdata(Config::default());

    // app, shapes, and the vendored ext
    assert_eq!(result.units, 3);
    assert_eq!(result.scanned, 6);
    // Point, Rect, Pair, Options, the function-local row, and Ext
    assert_eq!(result.facts_published, 6);
    assert!(result
        .facts
        .iter()
        .any(|f| f.symbol == SymbolKey::new("example.com/demo/shapes", "Point")
            && f.fields == vec!["X", "Y"]));
    assert!(!result
        .facts
        .iter()
        .any(|f| f.symbol.name == "Grouped" || f.symbol.name == "Plain"));
}

#[test]
fn test_testdata_suppressed_origin() {
    let result = run_testdata(Config::default());

    assert_eq!(result.suppressed.len(), 1);
    let suppressed = &result.suppressed[0];
    assert_eq!(suppressed.diagnostic.file, "app/main.go");
    assert_eq!(suppressed.diagnostic.line(), 26);
    assert_eq!(suppressed.suppression.reason, "zero origin is intended");
}

#[test]
fn test_testdata_with_tests_and_sequential() {
    let config = Config {
        include_tests: Some(true),
        parallel: Some(false),
        ..Default::default()
    };
    let result = run_testdata(config);

    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.file == "app/app_test.go" && d.message == "uninitialized struct fields: X, Y"));
    assert_eq!(result.diagnostics.len(), 11);
}

#[test]
fn test_vendored_facts_without_vendored_diagnostics() {
    let result = run_testdata(Config::default());
    assert!(result
        .facts
        .iter()
        .any(|f| f.symbol == SymbolKey::new("example.com/ext", "Ext") && f.fields == vec!["A", "B"]));
    assert!(result.diagnostics.iter().all(|d| !d.file.starts_with("vendor/")));
    assert!(result
        .suppressed
        .iter()
        .all(|s| !s.diagnostic.file.starts_with("vendor/")));
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const CONFIG_PKG: &str = r#"package config

//lint:exhauststruct
type Server struct {
	Host string
	Port int
	TLS  bool
}
"#;

const CMD_PKG: &str = r#"package main

import "example.com/scratch/config"

func main() {
	_ = config.Server{Host: "localhost", TLS: true}
	_ = config.Server{Host: "localhost", Port: 80, TLS: true}
	_ = config.Server{"localhost", 80, true}
}
"#;

#[test]
fn test_fact_crosses_package_boundary() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "go.mod", "module example.com/scratch\n");
    write(temp.path(), "config/config.go", CONFIG_PKG);
    write(temp.path(), "cmd/main.go", CMD_PKG);

    let result = Runner::new(temp.path(), Config::default()).run().unwrap();
    assert_eq!(
        findings(&result.diagnostics),
        vec![finding("cmd/main.go", 6, 6, "Port")]
    );
}

#[test]
fn test_alias_from_other_package_reaches_fact() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "go.mod", "module example.com/scratch\n");
    write(
        temp.path(),
        "config/config.go",
        &format!("{}\ntype Srv = Server\n", CONFIG_PKG),
    );
    write(
        temp.path(),
        "alias/alias.go",
        "package alias\n\nimport \"example.com/scratch/config\"\n\ntype S = config.Srv\n",
    );
    write(
        temp.path(),
        "cmd/main.go",
        r#"package main

import (
	"example.com/scratch/alias"
	"example.com/scratch/config"
)

var (
	_ = config.Srv{Host: "h", Port: 1}
	_ = alias.S{Port: 1, TLS: true}
	_ = config.Srv{Host: "h", Port: 1, TLS: false}
)
"#,
    );

    let result = Runner::new(temp.path(), Config::default()).run().unwrap();
    assert_eq!(
        findings(&result.diagnostics),
        vec![
            finding("cmd/main.go", 9, 6, "TLS"),
            finding("cmd/main.go", 10, 6, "Host"),
        ]
    );
}

#[test]
fn test_check_subdirectory_of_module() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "go.mod", "module example.com/scratch\n");
    write(temp.path(), "pkg/config/config.go", CONFIG_PKG);
    write(
        temp.path(),
        "pkg/cmd/main.go",
        &CMD_PKG.replace("example.com/scratch/config", "example.com/scratch/pkg/config"),
    );

    let root = Runner::new(temp.path(), Config::default()).run().unwrap();
    let sub = Runner::new(temp.path().join("pkg"), Config::default()).run().unwrap();

    assert_eq!(root.diagnostics.len(), 1);
    assert_eq!(
        findings(&sub.diagnostics),
        vec![finding("cmd/main.go", 6, 6, "Port")]
    );
    assert_eq!(
        sub.facts[0].symbol,
        SymbolKey::new("example.com/scratch/pkg/config", "Server")
    );
}

#[test]
fn test_vendored_dependency_publishes_facts() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "go.mod", "module example.com/scratch\n");
    write(
        temp.path(),
        "vendor/example.com/ext/ext.go",
        "package ext\n\n//lint:exhauststruct\ntype Ext struct {\n\tA int\n\tB int\n}\n\nvar _ = Ext{}\n",
    );
    write(
        temp.path(),
        "main.go",
        "package main\n\nimport \"example.com/ext\"\n\nvar _ = ext.Ext{A: 1}\n",
    );

    let result = Runner::new(temp.path(), Config::default()).run().unwrap();
    assert_eq!(findings(&result.diagnostics), vec![finding("main.go", 5, 9, "B")]);
    assert_eq!(result.units, 2);
}

#[test]
fn test_fact_not_visible_before_declaring_unit_runs() {
    let config = Unit::from_sources("example.com/scratch/config", &[("config.go", CONFIG_PKG)])
        .unwrap();
    let cmd = Unit::from_sources("example.com/scratch/cmd", &[("main.go", CMD_PKG)]).unwrap();
    let key = SymbolKey::new("example.com/scratch/config", "Server");

    // Checking cmd first: the fact does not exist yet, nothing is reported
    let facts = FactStore::new();
    let mut diagnostics = Vec::new();
    let mut pass = Pass::new(&ANALYZER, &cmd, &facts, &mut diagnostics);
    (ANALYZER.run)(&mut pass).unwrap();
    assert!(diagnostics.is_empty());
    assert!(facts.lookup(&key).is_none());

    // The driver orders config before cmd regardless of insertion order
    let mut ctx = AnalysisContext::new(".", Some("example.com/scratch".to_string()));
    ctx.add_unit(cmd);
    ctx.add_unit(config);
    let diagnostics = ctx.run(&[&ANALYZER], true).unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "uninitialized struct fields: Port");
    assert_eq!(ctx.facts().lookup(&key).unwrap().fields, vec!["Host", "Port", "TLS"]);
}

#[test]
fn test_import_cycle_fails_run() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "go.mod", "module m\n");
    write(temp.path(), "a/a.go", "package a\n\nimport _ \"fmt\"\nimport \"m/b\"\n\nvar _ = b.X\n");
    write(temp.path(), "b/b.go", "package b\n\nimport \"m/a\"\n\nvar X = a.Y\n");

    let err = Runner::new(temp.path(), Config::default()).run().unwrap_err();
    assert!(err.to_string().contains("import cycle"), "{}", err);
}

#[test]
fn test_config_module_override_and_exclusion() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "config/config.go", CONFIG_PKG);
    write(temp.path(), "cmd/main.go", CMD_PKG);
    write(temp.path(), "gen/gen.go", "package gen\n\nimport \"example.com/scratch/config\"\n\nvar _ = config.Server{}\n");
    write(
        temp.path(),
        "exhauststruct.yaml",
        "module: example.com/scratch\nexcluded_paths:\n  - \"gen/**\"\n",
    );

    let config = Config::discover(temp.path()).unwrap();
    let result = Runner::new(temp.path(), config).run().unwrap();
    assert_eq!(result.units, 2);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].file, "cmd/main.go");
}
