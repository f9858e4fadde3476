//! Analysis pass plumbing: analyzer descriptors, the per-unit pass handle,
//! and the diagnostic sink.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FactError, FactStore, Span, StructFact, SymbolKey, Unit};

/// A reported finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the analyzer that produced it.
    pub analyzer: String,
    /// File path relative to the analyzed root.
    pub file: String,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        self.span.start_line
    }
}

/// Receives diagnostics from a pass. Fire-and-forget.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Entry point of an analyzer, run once per unit.
pub type RunFn = fn(&mut Pass<'_>) -> anyhow::Result<()>;

/// Static description of an analysis pass.
#[derive(Debug)]
pub struct Analyzer {
    pub name: &'static str,
    pub doc: &'static str,
    pub run: RunFn,
}

/// The state handed to an analyzer while it processes one unit.
///
/// The fact store is shared with every other unit of the run; the driver
/// guarantees that all units imported by `unit` have already been analyzed.
pub struct Pass<'a> {
    pub analyzer: &'a Analyzer,
    pub unit: &'a Unit,
    facts: &'a FactStore,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> Pass<'a> {
    pub fn new(
        analyzer: &'a Analyzer,
        unit: &'a Unit,
        facts: &'a FactStore,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            analyzer,
            unit,
            facts,
            sink,
        }
    }

    /// Publish a fact about a symbol declared in this unit.
    pub fn export_fact(&self, key: SymbolKey, fact: StructFact) -> Result<(), FactError> {
        self.facts.publish(key, fact)
    }

    /// Read a fact published by this unit or any unit analyzed before it.
    /// `key` may name an alias recorded by an earlier unit.
    pub fn import_fact(&self, key: &SymbolKey) -> Option<Arc<StructFact>> {
        self.facts.lookup_resolved(key)
    }

    /// Report a diagnostic at `span` in `file`.
    pub fn report(&mut self, file: &str, span: Span, message: String) {
        self.sink.report(Diagnostic {
            analyzer: self.analyzer.name.to_string(),
            file: file.to_string(),
            span,
            message,
        });
    }
}
