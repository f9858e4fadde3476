//! Type resolution for literal types.
//!
//! Maps the type expression of a composite literal to the symbol that
//! declares it. Resolution covers what a literal can name: function-local
//! types, package-level types (following aliases), types qualified by an
//! imported package, and types brought in by dot imports. Anything else
//! (anonymous structs, maps, slices, builtins) does not resolve.

use std::collections::HashMap;

use tree_sitter::Node;

use super::facts::MAX_ALIAS_DEPTH;
use super::unit::{PackageNames, SourceFile, Unit};
use super::{Span, SymbolKey};

/// Outcome of resolving a literal type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The type names exactly this symbol.
    Symbol(SymbolKey),
    /// An unqualified name not declared in the package; it may come from one
    /// of these dot-imported packages.
    DotImported(Vec<SymbolKey>),
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AliasTarget {
    /// Another type name of the same package.
    Local(String),
    Named(SymbolKey),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Declared {
    Defined,
    Alias(AliasTarget),
}

/// Package-level type names of a unit.
#[derive(Debug, Default)]
pub struct TypeTable {
    declared: HashMap<String, Declared>,
}

impl TypeTable {
    /// Collect the package-level type declarations of `files`.
    pub fn build(files: &[SourceFile], known: &PackageNames) -> Self {
        let mut declared = HashMap::new();

        for file in files {
            let root = file.root();
            let mut cursor = root.walk();
            for decl in root.named_children(&mut cursor) {
                if decl.kind() != "type_declaration" {
                    continue;
                }
                for spec in type_specs(decl) {
                    let Some(name) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let entry = match spec.kind() {
                        "type_alias" => Declared::Alias(
                            spec.child_by_field_name("type")
                                .map(|target| alias_target(file, target, known))
                                .unwrap_or(AliasTarget::Unknown),
                        ),
                        _ => Declared::Defined,
                    };
                    declared.insert(file.text(name).to_string(), entry);
                }
            }
        }

        Self { declared }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declared.contains_key(name)
    }

    /// Package-level aliases with the symbol each one denotes. Aliases whose
    /// target is not a named type are left out.
    pub fn aliases(&self, import_path: &str) -> Vec<(SymbolKey, SymbolKey)> {
        let mut out: Vec<_> = self
            .declared
            .iter()
            .filter(|(_, declared)| matches!(declared, Declared::Alias(_)))
            .filter_map(|(name, _)| {
                let target = self.resolve(import_path, name)?;
                Some((SymbolKey::new(import_path, name.as_str()), target))
            })
            .collect();
        out.sort();
        out
    }

    /// Resolve a package-level name to its defining symbol.
    pub fn resolve(&self, import_path: &str, name: &str) -> Option<SymbolKey> {
        self.resolve_at_depth(import_path, name, 0)
    }

    fn resolve_at_depth(&self, import_path: &str, name: &str, depth: usize) -> Option<SymbolKey> {
        if depth > MAX_ALIAS_DEPTH {
            return None;
        }
        match self.declared.get(name)? {
            Declared::Defined => Some(SymbolKey::new(import_path, name)),
            Declared::Alias(AliasTarget::Local(target)) => {
                self.resolve_at_depth(import_path, target, depth + 1)
            }
            Declared::Alias(AliasTarget::Named(key)) => Some(key.clone()),
            Declared::Alias(AliasTarget::Unknown) => None,
        }
    }
}

fn alias_target(file: &SourceFile, node: Node, known: &PackageNames) -> AliasTarget {
    match node.kind() {
        "type_identifier" => AliasTarget::Local(file.text(node).to_string()),
        "qualified_type" => match qualified_parts(file, node) {
            Some((qualifier, name)) => match file.resolve_qualifier(qualifier, known) {
                Some(path) => AliasTarget::Named(SymbolKey::new(path, name)),
                None => AliasTarget::Unknown,
            },
            None => AliasTarget::Unknown,
        },
        "generic_type" | "parenthesized_type" => match unwrap_type(node) {
            Some(inner) => alias_target(file, inner, known),
            None => AliasTarget::Unknown,
        },
        _ => AliasTarget::Unknown,
    }
}

/// The `type_spec`/`type_alias` children of a `type_declaration`.
pub fn type_specs(decl: Node) -> Vec<Node> {
    let mut cursor = decl.walk();
    decl.named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "type_spec" | "type_alias"))
        .collect()
}

/// Symbol key of a function-local type spec.
pub fn local_key(unit: &Unit, file: &SourceFile, spec: Node) -> Option<SymbolKey> {
    let name = spec.child_by_field_name("name")?;
    let at = Span::from_node(name);
    Some(SymbolKey::local(
        unit.import_path.as_str(),
        file.text(name),
        format!("{}:{}", file.rel_path, at),
    ))
}

/// Resolve the type expression of a literal.
pub fn resolve_type(unit: &Unit, file: &SourceFile, type_node: Node) -> Resolution {
    resolve_node(unit, file, type_node, 0)
}

fn resolve_node(unit: &Unit, file: &SourceFile, node: Node, depth: usize) -> Resolution {
    if depth > MAX_ALIAS_DEPTH {
        return Resolution::Unresolved;
    }

    match node.kind() {
        "type_identifier" => {
            let name = file.text(node);
            if let Some(spec) = find_local_type(file, name, node) {
                return resolve_local_spec(unit, file, spec, depth);
            }
            if unit.types.contains(name) {
                return match unit.types.resolve(&unit.import_path, name) {
                    Some(key) => Resolution::Symbol(key),
                    None => Resolution::Unresolved,
                };
            }
            let candidates: Vec<SymbolKey> = file
                .dot_imports()
                .map(|path| SymbolKey::new(path, name))
                .collect();
            if candidates.is_empty() {
                Resolution::Unresolved
            } else {
                Resolution::DotImported(candidates)
            }
        }
        "qualified_type" => {
            let Some((qualifier, name)) = qualified_parts(file, node) else {
                return Resolution::Unresolved;
            };
            match file.resolve_qualifier(qualifier, unit.package_names()) {
                Some(path) => Resolution::Symbol(SymbolKey::new(path, name)),
                None => Resolution::Unresolved,
            }
        }
        "generic_type" | "parenthesized_type" => match unwrap_type(node) {
            Some(inner) => resolve_node(unit, file, inner, depth),
            None => Resolution::Unresolved,
        },
        _ => Resolution::Unresolved,
    }
}

fn resolve_local_spec(unit: &Unit, file: &SourceFile, spec: Node, depth: usize) -> Resolution {
    match spec.kind() {
        "type_spec" => match local_key(unit, file, spec) {
            Some(key) => Resolution::Symbol(key),
            None => Resolution::Unresolved,
        },
        "type_alias" => match spec.child_by_field_name("type") {
            Some(target) => resolve_node(unit, file, target, depth + 1),
            None => Resolution::Unresolved,
        },
        _ => Resolution::Unresolved,
    }
}

/// The base type of a generic instantiation or a parenthesized type.
fn unwrap_type(node: Node) -> Option<Node> {
    match node.kind() {
        "generic_type" => node.child_by_field_name("type"),
        "parenthesized_type" => node.named_child(0),
        _ => None,
    }
}

fn qualified_parts<'f>(file: &'f SourceFile, node: Node) -> Option<(&'f str, &'f str)> {
    let package = node.child_by_field_name("package")?;
    let name = node.child_by_field_name("name")?;
    Some((file.text(package), file.text(name)))
}

/// Find a type spec named `name` declared in a function scope enclosing
/// `at`, innermost scope first. Only declarations preceding `at` are visible.
fn find_local_type<'t>(file: &SourceFile, name: &str, at: Node<'t>) -> Option<Node<'t>> {
    let mut current = at.parent();
    while let Some(scope) = current {
        if scope.kind() == "source_file" {
            break;
        }
        if let Some(spec) = declared_in_scope(file, scope, name, at.start_byte()) {
            return Some(spec);
        }
        current = scope.parent();
    }
    None
}

fn declared_in_scope<'t>(
    file: &SourceFile,
    scope: Node<'t>,
    name: &str,
    before: usize,
) -> Option<Node<'t>> {
    let mut found = None;
    for stmt in scope_statements(scope) {
        if stmt.kind() != "type_declaration" || stmt.start_byte() >= before {
            continue;
        }
        for spec in type_specs(stmt) {
            if let Some(spec_name) = spec.child_by_field_name("name") {
                if file.text(spec_name) == name {
                    found = Some(spec);
                }
            }
        }
    }
    found
}

/// Statements directly inside a scope node, looking through `statement_list`.
fn scope_statements(scope: Node) -> Vec<Node> {
    let mut cursor = scope.walk();
    let mut out = Vec::new();
    for child in scope.named_children(&mut cursor) {
        if child.kind() == "statement_list" {
            let mut inner = child.walk();
            out.extend(child.named_children(&mut inner));
        } else {
            out.push(child);
        }
    }
    out
}
