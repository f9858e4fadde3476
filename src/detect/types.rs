//! Core types for check results.

use serde::{Deserialize, Serialize};

use crate::analysis::{Diagnostic, PublishedFact};

use super::SuppressedDiagnostic;

/// Results of a check run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics that were suppressed by inline comments
    #[serde(default)]
    pub suppressed: Vec<SuppressedDiagnostic>,
    /// Number of units (packages) analyzed
    pub units: usize,
    /// Number of files scanned
    pub scanned: usize,
    /// Number of struct facts published
    pub facts_published: usize,
    /// Every published fact, for export
    #[serde(skip)]
    pub facts: Vec<PublishedFact>,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any unsuppressed diagnostic remains.
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Number of suppressed diagnostics.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }

    /// Sort diagnostics by file, then position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            (&a.file, a.span.start_line, a.span.start_col)
                .cmp(&(&b.file, b.span.start_line, b.span.start_col))
        });
        self.suppressed.sort_by(|a, b| {
            (&a.diagnostic.file, a.diagnostic.span.start_line)
                .cmp(&(&b.diagnostic.file, b.diagnostic.span.start_line))
        });
    }
}
