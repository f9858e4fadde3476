//! exhauststruct - exhaustive struct literal checker for Go.
//!
//! Struct types whose doc comment carries `//lint:exhauststruct` are opted
//! in. Every keyed composite literal of an opted-in type must then name all
//! of its fields, including literals written in other packages that import
//! the type.
//!
//! # Architecture
//!
//! - `analysis`: tree-sitter Go front end, units, fact store, and the pass
//!   driver that runs units in import order
//! - `detect`: the exhauststruct analyzer (scanner, publisher, checker),
//!   inline suppressions, and the runner
//! - `plugin`: analyzer registration
//! - `config`: YAML config schema
//! - `report`: Output formatting (pretty, JSON, SARIF)

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod report;

pub use analysis::{
    register_analyzers, AnalysisContext, Diagnostic, FactStore, StructFact, SymbolKey, Unit,
};
pub use config::Config;
pub use detect::{CheckResult, Runner};
pub use error::HostError;

/// Initialize all subsystems.
///
/// Call this once at startup.
pub fn init() {
    register_analyzers();
}
