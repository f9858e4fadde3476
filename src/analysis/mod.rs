//! Unit-based analysis framework for Go sources.
//!
//! Source files are parsed with tree-sitter and grouped into units (Go
//! packages). Analyzers run once per unit and may publish facts about the
//! unit's declarations; facts are visible to every unit analyzed later.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Source Files    │────▶│ GoAnalyzer   │────▶│ Units         │
//! └─────────────────┘     │ (tree-sitter)│     │ (per package) │
//!                         └──────────────┘     └───────────────┘
//!                                                      │
//!                                                      ▼
//!                         ┌──────────────┐     ┌───────────────┐
//!                         │ Analyzers    │◀───▶│AnalysisContext│
//!                         │ (Pass)       │     │ (FactStore,   │
//!                         └──────────────┘     │  import order)│
//!                                              └───────────────┘
//! ```
//!
//! Units are analyzed in waves: a unit only runs once every unit it imports
//! has finished, and units of the same wave run in parallel.

mod context;
mod facts;
mod languages;
mod pass;
mod resolve;
mod traits;
mod unit;

pub use context::{read_module_path, AnalysisContext};
pub use facts::{
    FactError, FactStore, FileFacts, Import, PublishedFact, Span, StructFact, SymbolKey,
};
pub use languages::{get_analyzer, go_analyzer, register_analyzers, GoAnalyzer};
pub use pass::{Analyzer, Diagnostic, DiagnosticSink, Pass, RunFn};
pub use resolve::{local_key, resolve_type, type_specs, Resolution, TypeTable};
pub use traits::{LanguageAnalyzer, ParsedFile};
pub use unit::{default_package_name, PackageNames, SourceFile, Unit};
