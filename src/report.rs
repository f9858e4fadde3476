//! Output formatting for exhauststruct results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analysis::Diagnostic;
use crate::detect::{CheckResult, SuppressedDiagnostic, SuppressionType};
use crate::plugin;

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub passed: bool,
    pub units_analyzed: usize,
    pub files_scanned: usize,
    pub facts_published: usize,
    pub diagnostics: Vec<JsonDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<JsonSuppressedDiagnostic>,
    pub suppressed_count: usize,
}

/// A single diagnostic in the JSON report.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub analyzer: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Suppressed diagnostic with suppression info.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSuppressedDiagnostic {
    pub diagnostic: JsonDiagnostic,
    pub suppression: JsonSuppression,
}

/// Suppression directive info.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSuppression {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    pub file: String,
    pub line: usize,
    #[serde(rename = "type")]
    pub suppression_type: SuppressionType,
}

/// Build the JSON report for a result.
pub fn json_report(path: &str, result: &CheckResult) -> JsonReport {
    let diagnostics = result.diagnostics.iter().map(diagnostic_to_json).collect();

    let suppressed = result
        .suppressed
        .iter()
        .map(|sd| JsonSuppressedDiagnostic {
            diagnostic: diagnostic_to_json(&sd.diagnostic),
            suppression: JsonSuppression {
                reason: sd.suppression.reason.clone(),
                file: sd.suppression.file.clone(),
                line: sd.suppression.line,
                suppression_type: sd.suppression.suppression_type,
            },
        })
        .collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        passed: !result.has_diagnostics(),
        units_analyzed: result.units,
        files_scanned: result.scanned,
        facts_published: result.facts_published,
        diagnostics,
        suppressed,
        suppressed_count: result.suppressed_count(),
    }
}

/// Render results in JSON format.
pub fn render_json(path: &str, result: &CheckResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&json_report(path, result))?)
}

/// Write results in JSON format.
pub fn write_json(path: &str, result: &CheckResult) -> anyhow::Result<()> {
    println!("{}", render_json(path, result)?);
    Ok(())
}

fn diagnostic_to_json(d: &Diagnostic) -> JsonDiagnostic {
    JsonDiagnostic {
        analyzer: d.analyzer.clone(),
        file: d.file.clone(),
        line: d.span.start_line,
        column: d.span.start_col,
        message: d.message.clone(),
    }
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "exhauststruct";

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifReport {
    pub version: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRule {
    pub id: String,
    #[serde(rename = "shortDescription")]
    pub short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    pub default_config: SarifRuleConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRuleConfig {
    pub level: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifResult {
    #[serde(rename = "ruleId")]
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    pub artifact_location: SarifArtifact,
    pub region: SarifRegion,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifArtifact {
    pub uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRegion {
    #[serde(rename = "startLine")]
    pub start_line: usize,
    #[serde(rename = "startColumn")]
    pub start_column: usize,
}

/// Build the SARIF report for a result.
pub fn sarif_report(result: &CheckResult) -> SarifReport {
    // Every registered analyzer is a rule
    let rules = plugin::analyzers()
        .iter()
        .map(|a| SarifRule {
            id: a.name.to_string(),
            short_description: SarifMessage {
                text: a.doc.to_string(),
            },
            default_config: SarifRuleConfig {
                level: "error".to_string(),
            },
        })
        .collect();

    let results = result
        .diagnostics
        .iter()
        .map(|d| SarifResult {
            rule_id: d.analyzer.clone(),
            level: "error".to_string(),
            message: SarifMessage {
                text: d.message.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifact {
                        uri: d.file.replace('\\', "/"),
                    },
                    region: SarifRegion {
                        start_line: d.span.start_line.max(1),
                        start_column: d.span.start_col.max(1),
                    },
                },
            }],
        })
        .collect();

    SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    rules,
                },
            },
            results,
        }],
    }
}

/// Render results in SARIF format.
pub fn render_sarif(result: &CheckResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&sarif_report(result))?)
}

/// Write results in SARIF format.
pub fn write_sarif(result: &CheckResult) -> anyhow::Result<()> {
    println!("{}", render_sarif(result)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(path: &str, result: &CheckResult, show_suppressed: bool) {
    // Header
    println!();
    print!("  ");
    print!("{}", "exhauststruct".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    println!(
        "  {}",
        format!(
            "{} packages, {} files, {} opted-in structs",
            result.units, result.scanned, result.facts_published
        )
        .dimmed()
    );
    println!();

    if !result.diagnostics.is_empty() {
        write_diagnostics(&result.diagnostics);
        println!();
    }

    if !result.suppressed.is_empty() {
        write_suppressed_summary(&result.suppressed, show_suppressed);
        println!();
    }

    write_final_status(result);
    println!();
}

fn write_diagnostics(diagnostics: &[Diagnostic]) {
    println!("  {} ({}):", "Diagnostics".bold(), diagnostics.len());
    println!();

    for d in diagnostics {
        print!("    {} ", "ERROR".red());
        print!("{}", d.file.blue());
        println!("{}", format!(":{}:{}", d.span.start_line, d.span.start_col).dimmed());

        // Message on next line, indented
        println!("            {}", d.message);
        println!();
    }
}

fn write_final_status(result: &CheckResult) {
    if result.has_diagnostics() {
        print!("  {}", "✗ FAIL".red());
        print!(
            "  {} literal(s) with uninitialized fields",
            result.diagnostics.len()
        );
    } else {
        print!("  {}", "✓ PASS".green());
    }

    if result.suppressed_count() > 0 {
        print!(
            "  {}",
            format!("({} suppressed)", result.suppressed_count()).dimmed()
        );
    }
    println!();
}

fn write_suppressed_summary(suppressed: &[SuppressedDiagnostic], show_details: bool) {
    println!("  {} ({}):", "Suppressed".dimmed(), suppressed.len());

    if !show_details {
        println!("    {}", "(use --show-suppressed to see details)".dimmed());
        return;
    }

    println!();
    for sd in suppressed {
        let d = &sd.diagnostic;
        let s = &sd.suppression;

        print!("    {}", d.file.blue());
        if s.suppression_type == SuppressionType::File {
            print!("{}", ":* (file)".dimmed());
        } else {
            print!("{}", format!(":{}", d.line()).dimmed());
        }
        println!();
        println!("            {}", d.message.dimmed());

        if !s.reason.is_empty() {
            println!("            {}", format!("reason: {:?}", s.reason).dimmed());
        }
    }
}
