//! Registration surface for analysis passes.
//!
//! The host looks analyzers up here; this module holds no logic of its own.

use crate::analysis::Analyzer;
use crate::detect;

static ANALYZERS: &[&Analyzer] = &[&detect::ANALYZER];

/// Every registered analyzer.
pub fn analyzers() -> &'static [&'static Analyzer] {
    ANALYZERS
}

/// Look up an analyzer by name.
pub fn get_analyzer(name: &str) -> Option<&'static Analyzer> {
    ANALYZERS.iter().copied().find(|a| a.name == name)
}
