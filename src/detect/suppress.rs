//! Inline suppression of diagnostics via comments.
//!
//! Supports suppression comments like:
//! - `// exhauststruct:ignore - <reason>`
//! - `// exhauststruct:ignore-next-line - <reason>`
//! - `// exhauststruct:ignore-file - <reason>`

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::analysis::{Diagnostic, SourceFile, Unit};

/// How a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionType {
    /// Applies to the same line
    Line,
    /// Applies to the next line
    NextLine,
    /// Applies to the entire file
    File,
}

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Human-readable reason
    pub reason: String,
    /// File containing the suppression
    pub file: String,
    /// Line number (0 for file-level)
    pub line: usize,
    /// How the suppression applies
    pub suppression_type: SuppressionType,
}

/// A diagnostic that was suppressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressedDiagnostic {
    pub diagnostic: Diagnostic,
    pub suppression: Suppression,
}

lazy_static::lazy_static! {
    static ref SUPPRESSION_PATTERN: Regex =
        Regex::new(r"^//\s*exhauststruct:(ignore(?:-file|-next-line)?)\b\s*(?:-\s*(.*))?")
            .expect("suppression pattern is valid");
}

/// Parse suppression directives from the comments of a file.
///
/// Only comment nodes are considered, so directive text inside string
/// literals has no effect.
pub fn parse_suppressions(file: &SourceFile) -> Vec<Suppression> {
    let root = file.root();
    let source = &file.parsed.source;

    // File-level suppressions only count above the first line of code
    let mut cursor = root.walk();
    let first_code = root
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")
        .map(|n| n.start_byte())
        .unwrap_or(usize::MAX);

    let mut comments = Vec::new();
    collect_comments(root, &mut comments);

    let mut suppressions = Vec::new();
    for comment in comments {
        let text = file.text(comment);
        let Some(caps) = SUPPRESSION_PATTERN.captures(text) else {
            continue;
        };
        let directive = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let reason = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let suppression_type = match directive {
            "ignore-file" if comment.start_byte() < first_code => SuppressionType::File,
            "ignore-file" => continue,
            "ignore-next-line" => SuppressionType::NextLine,
            // Alone on its line it covers the line below, otherwise its own line
            "ignore" if alone_on_line(source, comment.start_byte()) => SuppressionType::NextLine,
            "ignore" => SuppressionType::Line,
            _ => continue,
        };

        suppressions.push(Suppression {
            reason,
            file: file.rel_path.clone(),
            line: if suppression_type == SuppressionType::File {
                0
            } else {
                comment.start_position().row + 1
            },
            suppression_type,
        });
    }

    suppressions
}

fn collect_comments<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == "comment" {
        out.push(node);
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_comments(child, out);
    }
}

/// Whether only whitespace precedes `start` on its line.
fn alone_on_line(source: &[u8], start: usize) -> bool {
    source[..start]
        .iter()
        .rev()
        .take_while(|&&b| b != b'\n')
        .all(|b| b.is_ascii_whitespace())
}

/// Check if a diagnostic matches a suppression.
pub fn matches_suppression(diagnostic: &Diagnostic, suppression: &Suppression) -> bool {
    if diagnostic.file != suppression.file {
        return false;
    }

    match suppression.suppression_type {
        SuppressionType::File => true,
        SuppressionType::Line => diagnostic.line() == suppression.line,
        SuppressionType::NextLine => diagnostic.line() == suppression.line + 1,
    }
}

/// Separate diagnostics into active and suppressed.
pub fn filter_suppressed(
    diagnostics: Vec<Diagnostic>,
    suppressions: &HashMap<String, Vec<Suppression>>,
) -> (Vec<Diagnostic>, Vec<SuppressedDiagnostic>) {
    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for diagnostic in diagnostics {
        let matched = suppressions
            .get(&diagnostic.file)
            .and_then(|list| list.iter().find(|s| matches_suppression(&diagnostic, s)))
            .cloned();
        match matched {
            Some(suppression) => suppressed.push(SuppressedDiagnostic {
                diagnostic,
                suppression,
            }),
            None => active.push(diagnostic),
        }
    }

    (active, suppressed)
}

/// Collect suppressions from every file of the given units, keyed by the
/// file's relative path.
pub fn collect_suppressions(units: &[Unit]) -> HashMap<String, Vec<Suppression>> {
    let mut result = HashMap::new();

    for file in units.iter().flat_map(|u| u.files.iter()) {
        let suppressions = parse_suppressions(file);
        if !suppressions.is_empty() {
            result.insert(file.rel_path.clone(), suppressions);
        }
    }

    result
}
