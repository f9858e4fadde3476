//! Literal checker: reports composite literals of opted-in struct types that
//! leave declared fields uninitialized.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;
use tree_sitter::Node;

use crate::analysis::{resolve_type, Pass, Resolution, SourceFile, Span, StructFact, SymbolKey};

/// How a literal supplies its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralForm {
    /// Value-only elements. Go requires these to cover every field.
    Positional,
    /// `field: value` elements, with the names supplied.
    Keyed(HashSet<String>),
}

/// A literal found in a file, with the type expression that gives its type.
#[derive(Debug, Clone, Copy)]
struct LiteralSite<'t> {
    /// Node reported on: the composite literal, or the bare `{...}` of a
    /// literal whose type is elided.
    node: Node<'t>,
    type_node: Node<'t>,
    body: Node<'t>,
}

/// Check every literal of the pass's unit. Returns the number of
/// diagnostics reported.
pub fn check_unit(pass: &mut Pass<'_>) -> usize {
    let unit = pass.unit;
    let mut reported = 0;

    for file in &unit.files {
        let mut sites = Vec::new();
        visit(file.root(), &mut sites);

        for site in sites {
            let Some(fact) = fact_for(pass, file, site) else {
                continue;
            };
            let LiteralForm::Keyed(keyed) = literal_form(file, site.body) else {
                continue;
            };
            let missing = missing_fields(&fact.fields, &keyed);
            if missing.is_empty() {
                continue;
            }
            pass.report(
                &file.rel_path,
                Span::from_node(site.node),
                format!("uninitialized struct fields: {}", missing.join(", ")),
            );
            reported += 1;
        }
    }

    reported
}

fn fact_for(pass: &Pass<'_>, file: &SourceFile, site: LiteralSite) -> Option<Arc<StructFact>> {
    match resolve_type(pass.unit, file, site.type_node) {
        Resolution::Symbol(key) => pass.import_fact(&key),
        Resolution::DotImported(candidates) => candidates
            .iter()
            .find_map(|key: &SymbolKey| pass.import_fact(key)),
        Resolution::Unresolved => {
            trace!(
                file = %file.rel_path,
                at = %Span::from_node(site.node),
                kind = site.type_node.kind(),
                "literal type not resolvable"
            );
            None
        }
    }
}

/// Declared fields absent from `keyed`, in declaration order.
pub fn missing_fields(declared: &[String], keyed: &HashSet<String>) -> Vec<String> {
    declared
        .iter()
        .filter(|field| !keyed.contains(field.as_str()))
        .cloned()
        .collect()
}

/// Classify the elements of a `literal_value`.
pub fn literal_form(file: &SourceFile, body: Node) -> LiteralForm {
    let mut keyed = HashSet::new();
    let mut cursor = body.walk();
    for element in body.named_children(&mut cursor) {
        match element.kind() {
            "keyed_element" => {
                let key = element
                    .child_by_field_name("key")
                    .or_else(|| element.named_child(0))
                    .and_then(unwrap_element);
                if let Some(key) = key {
                    keyed.insert(file.text(key).trim().to_string());
                }
            }
            "comment" => {}
            _ => return LiteralForm::Positional,
        }
    }
    LiteralForm::Keyed(keyed)
}

/// Look through the `literal_element` wrapper around keys and values.
fn unwrap_element(node: Node) -> Option<Node> {
    if node.kind() == "literal_element" {
        node.named_child(0)
    } else {
        Some(node)
    }
}

fn visit<'t>(node: Node<'t>, sites: &mut Vec<LiteralSite<'t>>) {
    if node.kind() == "composite_literal" {
        if let (Some(type_node), Some(body)) = (
            node.child_by_field_name("type"),
            node.child_by_field_name("body"),
        ) {
            sites.push(LiteralSite {
                node,
                type_node,
                body,
            });
            visit_body(body, type_node, sites);
            return;
        }
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        visit(child, sites);
    }
}

/// Walk the elements of a literal whose type is `ty`, giving elided inner
/// literals the element (or key) type of `ty`.
fn visit_body<'t>(body: Node<'t>, ty: Node<'t>, sites: &mut Vec<LiteralSite<'t>>) {
    let element = element_type(ty);
    let key = key_type(ty);

    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "keyed_element" => {
                if let Some(k) = child.child_by_field_name("key").or_else(|| child.named_child(0)) {
                    visit_element(k, key, sites);
                }
                let count = child.named_child_count();
                if let Some(v) = child
                    .child_by_field_name("value")
                    .or_else(|| count.checked_sub(1).and_then(|i| child.named_child(i)))
                {
                    visit_element(v, element, sites);
                }
            }
            "comment" => {}
            _ => visit_element(child, element, sites),
        }
    }
}

fn visit_element<'t>(node: Node<'t>, hint: Option<Node<'t>>, sites: &mut Vec<LiteralSite<'t>>) {
    let Some(inner) = unwrap_element(node) else {
        return;
    };
    if inner.kind() != "literal_value" {
        visit(inner, sites);
        return;
    }
    match hint {
        Some(ty) => {
            sites.push(LiteralSite {
                node: inner,
                type_node: ty,
                body: inner,
            });
            visit_body(inner, ty, sites);
        }
        None => visit(inner, sites),
    }
}

/// Element type of a slice, array, or map literal type.
fn element_type(ty: Node) -> Option<Node> {
    let element = match ty.kind() {
        "slice_type" | "array_type" | "implicit_length_array_type" => {
            ty.child_by_field_name("element")
        }
        "map_type" => ty.child_by_field_name("value"),
        _ => None,
    }?;
    Some(strip_pointer(element))
}

fn key_type(ty: Node) -> Option<Node> {
    match ty.kind() {
        "map_type" => ty.child_by_field_name("key").map(strip_pointer),
        _ => None,
    }
}

/// `*T` elements may elide `&T` as well.
fn strip_pointer(node: Node) -> Node {
    if node.kind() == "pointer_type" {
        node.named_child(0).unwrap_or(node)
    } else {
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Diagnostic, FactStore, Unit};
    use crate::detect::ANALYZER;

    fn check(source: &str) -> Vec<Diagnostic> {
        let unit = Unit::from_sources("example.com/m/app", &[("a.go", source)]).unwrap();
        let facts = FactStore::new();
        let mut diagnostics = Vec::new();
        let mut pass = Pass::new(&ANALYZER, &unit, &facts, &mut diagnostics);
        (ANALYZER.run)(&mut pass).unwrap();
        diagnostics
    }

    fn messages(source: &str) -> Vec<String> {
        check(source).into_iter().map(|d| d.message).collect()
    }

    const DECL: &str = r#"
package app

//lint:exhauststruct
type S struct {
    a int
    b int
    c int
}
"#;

    #[test]
    fn test_missing_field_reported() {
        let source = format!("{}\nvar x = S{{a: 1, c: 3}}\n", DECL);
        let diagnostics = check(&source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "uninitialized struct fields: b");
        assert_eq!(diagnostics[0].span.start_line, 11);
        assert_eq!(diagnostics[0].span.start_col, 9);
        assert_eq!(diagnostics[0].file, "a.go");
    }

    #[test]
    fn test_complete_literal_is_clean() {
        let source = format!("{}\nvar x = S{{a: 1, b: 2, c: 3}}\n", DECL);
        assert!(check(&source).is_empty());
    }

    #[test]
    fn test_positional_literal_is_clean() {
        let source = format!("{}\nvar x = S{{1, 2, 3}}\n", DECL);
        assert!(check(&source).is_empty());
    }

    #[test]
    fn test_empty_literal_lists_all_fields_in_order() {
        let source = format!("{}\nvar x = S{{c: 3}}\nvar y = S{{}}\n", DECL);
        assert_eq!(
            messages(&source),
            vec![
                "uninitialized struct fields: a, b",
                "uninitialized struct fields: a, b, c",
            ]
        );
    }

    #[test]
    fn test_pointer_and_nested_literals() {
        let source = format!(
            "{}\nfunc f() *S {{\n    return &S{{a: 1, b: S{{}}.a}}\n}}\n",
            DECL
        );
        assert_eq!(
            messages(&source),
            vec![
                "uninitialized struct fields: c",
                "uninitialized struct fields: a, b, c",
            ]
        );
    }

    #[test]
    fn test_elided_element_literals() {
        let source = format!(
            r#"{}
var xs = []S{{
    {{a: 1, b: 2, c: 3}},
    {{a: 1}},
    {{1, 2, 3}},
}}
var ps = []*S{{{{b: 2, c: 3}}}}
var m = map[string]S{{"k": {{a: 1, b: 2}}}}
"#,
            DECL
        );
        assert_eq!(
            messages(&source),
            vec![
                "uninitialized struct fields: b, c",
                "uninitialized struct fields: a",
                "uninitialized struct fields: c",
            ]
        );
    }

    #[test]
    fn test_not_opted_in_never_reported() {
        let diagnostics = check(
            r#"
package app

type T struct {
    a int
    b int
}

var t = T{a: 1}
"#,
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_alias_resolves_to_opted_in_type() {
        let source = format!("{}\ntype A = S\n\nvar x = A{{b: 1}}\n", DECL);
        assert_eq!(messages(&source), vec!["uninitialized struct fields: a, c"]);
    }

    #[test]
    fn test_local_type_shadows_opted_in_type() {
        let source = format!(
            r#"{}
func f() {{
    type S struct{{ z int }}
    _ = S{{}}
}}
"#,
            DECL
        );
        assert!(check(&source).is_empty());
    }

    #[test]
    fn test_missing_fields_keeps_declaration_order() {
        let declared: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let keyed: HashSet<String> = ["y".to_string()].into_iter().collect();
        assert_eq!(missing_fields(&declared, &keyed), vec!["x", "z"]);
        assert!(missing_fields(&declared, &declared.iter().cloned().collect()).is_empty());
    }
}
