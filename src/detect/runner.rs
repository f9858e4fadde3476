//! Check runner that orchestrates discovery, analysis, and suppression.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::analysis::{AnalysisContext, Analyzer};
use crate::config::Config;
use crate::error::HostError;
use crate::plugin;

use super::{collect_suppressions, filter_suppressed, CheckResult};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["testdata", "node_modules"];

/// Vendored dependencies, loaded from the root only.
const VENDOR_DIR: &str = "vendor";

/// Executes the registered analyzers against a Go source tree.
pub struct Runner {
    base_dir: PathBuf,
    config: Config,
    analyzers: Vec<&'static Analyzer>,
}

impl Runner {
    /// Create a new runner with every registered analyzer.
    pub fn new<P: AsRef<Path>>(base_dir: P, config: Config) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            config,
            analyzers: plugin::analyzers().to_vec(),
        }
    }

    /// Collect the `.go` files under the base directory.
    pub fn collect_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        if !self.base_dir.is_dir() {
            return Err(HostError::Io {
                path: self.base_dir.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            }
            .into());
        }

        let include_tests = self.config.should_include_tests();
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.base_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                if name == VENDOR_DIR {
                    return e.depth() == 1;
                }
                // Skip hidden and fixture directories
                !(name.starts_with('.') || name.starts_with('_') || SKIPPED_DIRS.contains(&&*name))
            })
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("go") {
                continue;
            }
            let rel = path.strip_prefix(&self.base_dir).unwrap_or(path);
            let vendored = rel.starts_with(VENDOR_DIR);
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if (vendored || !include_tests) && name.ends_with("_test.go") {
                continue;
            }
            if self.config.is_path_excluded(rel) {
                debug!(file = %rel.display(), "excluded by config");
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Analyze the whole tree.
    pub fn run(&self) -> anyhow::Result<CheckResult> {
        let files = self.collect_files()?;
        if files.is_empty() {
            return Err(HostError::NoSources(self.base_dir.clone()).into());
        }
        self.run_files(&files)
    }

    /// Analyze the given files.
    pub fn run_files(&self, files: &[PathBuf]) -> anyhow::Result<CheckResult> {
        let mut ctx = AnalysisContext::new(&self.base_dir, self.config.module.clone());
        let scanned = ctx.load_files(files);
        info!(
            module = %ctx.module_path(),
            files = scanned,
            units = ctx.units().len(),
            "analyzing"
        );

        let diagnostics = ctx.run(&self.analyzers, self.config.is_parallel())?;

        let mut result = CheckResult::new();
        result.scanned = scanned;
        result.units = ctx.units().len();
        result.facts = ctx.facts().snapshot();
        result.facts_published = result.facts.len();

        // Apply suppressions - filter diagnostics and track suppressed ones
        let suppressions = collect_suppressions(ctx.units());
        let (active, suppressed) = filter_suppressed(diagnostics, &suppressions);
        result.diagnostics = active;
        result.suppressed = suppressed;
        result.sort();

        Ok(result)
    }
}
