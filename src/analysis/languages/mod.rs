//! Language front ends.

mod go;

pub use go::GoAnalyzer;

use super::LanguageAnalyzer;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Static storage for Go analyzer.
static GO_ANALYZER: OnceCell<GoAnalyzer> = OnceCell::new();

/// Whether analyzers have been registered.
static REGISTERED: AtomicBool = AtomicBool::new(false);

/// Register all available language front ends.
///
/// This is idempotent - calling it multiple times is safe.
pub fn register_analyzers() {
    if REGISTERED.swap(true, Ordering::SeqCst) {
        return; // Already registered
    }

    GO_ANALYZER.get_or_init(GoAnalyzer::new);
}

/// Get a front end for the given file extension.
///
/// Returns None if no front end is registered for the extension.
pub fn get_analyzer(ext: &str) -> Option<&'static dyn LanguageAnalyzer> {
    // Ensure analyzers are registered
    register_analyzers();

    match ext {
        "go" => GO_ANALYZER.get().map(|a| a as &'static dyn LanguageAnalyzer),
        _ => None,
    }
}

/// The Go front end.
pub fn go_analyzer() -> &'static GoAnalyzer {
    GO_ANALYZER.get_or_init(GoAnalyzer::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_analyzer_by_extension() {
        let go = get_analyzer("go").unwrap();
        assert_eq!(go.language_id(), "go");
        assert!(go.handles_extension("go"));
        assert!(get_analyzer("rs").is_none());
    }
}
