//! Declaration scanner: finds struct types opted into exhaustiveness checking.
//!
//! A declaration is opted in when it is the only spec of its `type`
//! declaration, its doc comment contains the exact line
//! `//lint:exhauststruct`, and it declares a struct with at least one field.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use crate::analysis::{go_analyzer, local_key, type_specs, SourceFile, Span, SymbolKey, Unit};

/// The opt-in marker. Matched exactly.
pub const SENTINEL: &str = "//lint:exhauststruct";

/// Tree-sitter query for every type declaration, package-level or local.
const TYPE_DECLARATION_QUERY: &str = "(type_declaration) @decl";

/// An opted-in struct declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub key: SymbolKey,
    /// Field names in declaration order.
    pub fields: Vec<String>,
    pub file: String,
    pub span: Span,
}

/// Scan every file of a unit.
pub fn scan_unit(unit: &Unit) -> anyhow::Result<Vec<StructDecl>> {
    let mut decls = Vec::new();
    for file in &unit.files {
        decls.extend(scan_file(unit, file)?);
    }
    Ok(decls)
}

/// Scan one file of a unit for opted-in struct declarations.
pub fn scan_file(unit: &Unit, file: &SourceFile) -> anyhow::Result<Vec<StructDecl>> {
    let query = Query::new(go_analyzer().language(), TYPE_DECLARATION_QUERY)?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, file.root(), &file.parsed.source[..]);

    let mut decls = Vec::new();
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if let Some(decl) = opted_in_struct(unit, file, capture.node) {
                decls.push(decl);
            }
        }
    }

    decls.sort_by_key(|d| d.span.start_byte);
    Ok(decls)
}

fn opted_in_struct(unit: &Unit, file: &SourceFile, decl: Node) -> Option<StructDecl> {
    let specs = type_specs(decl);
    // Grouped declarations share one doc comment and are never opted in
    if specs.len() != 1 {
        return None;
    }
    if !doc_comments(decl).iter().any(|c| is_sentinel(file.text(*c))) {
        return None;
    }

    let spec = specs[0];
    if spec.kind() != "type_spec" {
        return None;
    }
    let struct_type = spec.child_by_field_name("type")?;
    if struct_type.kind() != "struct_type" {
        return None;
    }

    let fields = struct_fields(file, struct_type);
    if fields.is_empty() {
        return None;
    }

    let key = if is_package_level(decl) {
        let name = spec.child_by_field_name("name")?;
        SymbolKey::new(unit.import_path.as_str(), file.text(name))
    } else {
        local_key(unit, file, spec)?
    };

    Some(StructDecl {
        key,
        fields,
        file: file.rel_path.clone(),
        span: Span::from_node(spec),
    })
}

/// Exact comparison with the sentinel; only a carriage return left by CRLF
/// line endings is dropped.
pub fn is_sentinel(comment: &str) -> bool {
    comment.strip_suffix('\r').unwrap_or(comment) == SENTINEL
}

fn is_package_level(decl: Node) -> bool {
    decl.parent().map(|p| p.kind() == "source_file").unwrap_or(false)
}

/// The doc comment group of a declaration: the comments directly above it,
/// with no blank line in between. A comment trailing code on the line above
/// belongs to that code, not to the declaration.
pub fn doc_comments(decl: Node) -> Vec<Node> {
    let mut group: Vec<Node> = Vec::new();
    let mut next_row = decl.start_position().row;
    let mut sibling = previous_sibling(decl);

    while let Some(node) = sibling {
        if node.kind() != "comment" {
            if let Some(earliest) = group.last() {
                if earliest.start_position().row == node.end_position().row {
                    group.pop();
                }
            }
            break;
        }
        if node.end_position().row + 1 < next_row {
            break;
        }
        next_row = node.start_position().row;
        group.push(node);
        sibling = previous_sibling(node);
    }

    group.reverse();
    group
}

fn previous_sibling(node: Node) -> Option<Node> {
    match node.prev_named_sibling() {
        Some(prev) => Some(prev),
        None => {
            // Look through an enclosing statement_list
            let parent = node.parent()?;
            if parent.kind() == "statement_list" {
                parent.prev_named_sibling()
            } else {
                None
            }
        }
    }
}

/// Field names of a struct type in declaration order.
///
/// Every name of a multi-name field (`a, b int`) is listed; an embedded
/// field contributes its type name.
pub fn struct_fields(file: &SourceFile, struct_type: Node) -> Vec<String> {
    let Some(list) = struct_type
        .named_child(0)
        .filter(|n| n.kind() == "field_declaration_list")
    else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    let mut cursor = list.walk();
    for field in list.named_children(&mut cursor) {
        if field.kind() != "field_declaration" {
            continue;
        }
        let mut names_cursor = field.walk();
        let names: Vec<String> = field
            .children_by_field_name("name", &mut names_cursor)
            .map(|n| file.text(n).to_string())
            .collect();
        if names.is_empty() {
            if let Some(name) = field
                .child_by_field_name("type")
                .and_then(|t| embedded_field_name(file, t))
            {
                fields.push(name);
            }
        } else {
            fields.extend(names);
        }
    }
    fields
}

/// Implicit field name of an embedded field: the unqualified type name.
fn embedded_field_name(file: &SourceFile, type_node: Node) -> Option<String> {
    match type_node.kind() {
        "type_identifier" => Some(file.text(type_node).to_string()),
        "qualified_type" => type_node
            .child_by_field_name("name")
            .map(|n| file.text(n).to_string()),
        "generic_type" => type_node
            .child_by_field_name("type")
            .and_then(|t| embedded_field_name(file, t)),
        "pointer_type" => type_node
            .named_child(0)
            .and_then(|t| embedded_field_name(file, t)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<StructDecl> {
        let unit = Unit::from_sources("example.com/m/app", &[("a.go", source)]).unwrap();
        scan_unit(&unit).unwrap()
    }

    #[test]
    fn test_sentinel_is_exact() {
        assert!(is_sentinel("//lint:exhauststruct"));
        assert!(is_sentinel("//lint:exhauststruct\r"));
        assert!(!is_sentinel("// lint:exhauststruct"));
        assert!(!is_sentinel("//lint:exhauststruct "));
        assert!(!is_sentinel(" //lint:exhauststruct"));
        assert!(!is_sentinel("//lint:exhaustive"));
    }

    #[test]
    fn test_opted_in_struct() {
        let decls = scan(
            r#"
package app

// S is checked
//lint:exhauststruct
type S struct {
    a int
    b string
    c bool
}
"#,
        );
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].key, SymbolKey::new("example.com/m/app", "S"));
        assert_eq!(decls[0].fields, vec!["a", "b", "c"]);
        assert_eq!(decls[0].span.start_line, 6);
    }

    #[test]
    fn test_not_opted_in_without_marker() {
        let decls = scan(
            r#"
package app

// S is a struct
type S struct {
    a int
}
"#,
        );
        assert!(decls.is_empty());
    }

    #[test]
    fn test_marker_separated_by_blank_line() {
        let decls = scan(
            r#"
package app

//lint:exhauststruct

type S struct {
    a int
}
"#,
        );
        assert!(decls.is_empty());
    }

    #[test]
    fn test_trailing_comment_is_not_doc() {
        let decls = scan(
            r#"
package app

var x = 1 //lint:exhauststruct
type S struct {
    a int
}
"#,
        );
        assert!(decls.is_empty());
    }

    #[test]
    fn test_grouped_declaration_never_opted_in() {
        let decls = scan(
            r#"
package app

//lint:exhauststruct
type (
    A struct{ a int }
    B struct{ b int }
)
"#,
        );
        assert!(decls.is_empty());
    }

    #[test]
    fn test_single_spec_group_is_eligible() {
        let decls = scan(
            r#"
package app

//lint:exhauststruct
type (
    A struct{ a int }
)
"#,
        );
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].fields, vec!["a"]);
    }

    #[test]
    fn test_non_struct_and_empty_struct_skipped() {
        let decls = scan(
            r#"
package app

//lint:exhauststruct
type ID int

//lint:exhauststruct
type Empty struct{}

//lint:exhauststruct
type Alias = struct{ a int }
"#,
        );
        assert!(decls.is_empty());
    }

    #[test]
    fn test_multi_name_and_embedded_fields() {
        let decls = scan(
            r#"
package app

import "sync"

//lint:exhauststruct
type S struct {
    x, y int
    *Base
    sync.Mutex
    name string `json:"name"`
}
"#,
        );
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].fields, vec!["x", "y", "Base", "Mutex", "name"]);
    }

    #[test]
    fn test_local_declaration_gets_scoped_key() {
        let decls = scan(
            r#"
package app

func f() {
    //lint:exhauststruct
    type row struct {
        id int
    }
    _ = row{id: 1}
}
"#,
        );
        assert_eq!(decls.len(), 1);
        assert!(decls[0].key.is_local());
        assert_eq!(decls[0].key.name, "row");
    }
}
