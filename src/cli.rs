//! Command-line interface for exhauststruct.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::detect::Runner;
use crate::plugin;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Flag struct literals that leave fields of opted-in Go types uninitialized.
///
/// A struct type is opted in by a `//lint:exhauststruct` line in its doc
/// comment. Every keyed literal of such a type, in its own package or in any
/// package importing it, must then name all of its fields.
#[derive(Parser)]
#[command(name = "exhauststruct")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a Go module for incomplete struct literals
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// List the registered analyzers
    List,
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Root of the Go module to check
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover in the root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Also analyze _test.go files
    #[arg(long)]
    pub tests: bool,

    /// Analyze packages one at a time
    #[arg(long)]
    pub no_parallel: bool,

    /// Show suppressed diagnostics in output
    #[arg(long)]
    pub show_suppressed: bool,

    /// Write every published struct fact to this file as JSON
    #[arg(long, value_name = "FILE")]
    pub export_facts: Option<PathBuf>,
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" && args.format != "sarif" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    // Resolve path
    let abs_path = args
        .path
        .canonicalize()
        .with_context(|| format!("cannot access path {:?}", args.path))?;
    if !abs_path.is_dir() {
        anyhow::bail!("{} is not a directory", abs_path.display());
    }

    let mut config = match &args.config {
        Some(path) => Config::parse_file(path)?,
        None => Config::discover(&abs_path)?,
    };
    if args.tests {
        config.include_tests = Some(true);
    }
    if args.no_parallel {
        config.parallel = Some(false);
    }
    debug!(?config, "configuration loaded");

    let runner = Runner::new(&abs_path, config);
    let result = runner.run()?;

    if let Some(out) = &args.export_facts {
        let json = serde_json::to_string_pretty(&result.facts)?;
        std::fs::write(out, json)
            .with_context(|| format!("failed to write facts to {}", out.display()))?;
    }

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &result)?,
        "sarif" => report::write_sarif(&result)?,
        _ => report::write_pretty(&path_str, &result, args.show_suppressed),
    }

    if result.has_diagnostics() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// List the registered analyzers.
pub fn run_list() -> anyhow::Result<i32> {
    println!("Registered analyzers:");
    println!();

    for analyzer in plugin::analyzers() {
        println!("  {:<20} {}", analyzer.name, analyzer.doc);
    }

    Ok(EXIT_SUCCESS)
}
