//! Fact structures shared between compilation units.
//!
//! A fact is the portable projection of an opted-in struct declaration: the
//! declaring symbol plus its ordered field names. Facts are published once
//! while a unit is analyzed and read back by every unit analyzed after it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on alias chains followed during resolution.
pub const MAX_ALIAS_DEPTH: usize = 16;

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Stable identity of a declared type, usable as a key across units.
///
/// Package-level types are identified by import path and name. Types declared
/// inside a function body also carry a scope (`file:line:col` of the type
/// name) since the same name may be declared in several functions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolKey {
    /// Import path of the declaring package.
    pub package: String,
    /// Declared type name.
    pub name: String,
    /// Position of a function-local declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl SymbolKey {
    /// Key for a package-level type.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            scope: None,
        }
    }

    /// Key for a type declared inside a function body.
    pub fn local(
        package: impl Into<String>,
        name: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            scope: Some(scope.into()),
        }
    }

    pub fn is_local(&self) -> bool {
        self.scope.is_some()
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}.{}@{}", self.package, self.name, scope),
            None => write!(f, "{}.{}", self.package, self.name),
        }
    }
}

/// Field set of an opted-in struct, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructFact {
    pub fields: Vec<String>,
}

impl StructFact {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

/// Errors raised by the fact store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactError {
    #[error("fact already published for {0}")]
    AlreadyPublished(SymbolKey),

    #[error("alias already recorded for {0}")]
    AliasExists(SymbolKey),
}

/// A published fact together with its key, as exported to JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedFact {
    pub symbol: SymbolKey,
    pub fields: Vec<String>,
}

/// Write-once store of struct facts shared by every unit of a run.
///
/// The store is passed explicitly to each pass. A key can be published once;
/// after that it is read-only. Package-level type aliases are recorded next
/// to the facts so that `pkg.Alias{}` written in another package reaches the
/// fact of the aliased type.
#[derive(Debug, Default)]
pub struct FactStore {
    facts: RwLock<HashMap<SymbolKey, Arc<StructFact>>>,
    aliases: RwLock<HashMap<SymbolKey, SymbolKey>>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fact for `key`.
    ///
    /// Fails without touching the store if a fact already exists for the key.
    pub fn publish(&self, key: SymbolKey, fact: StructFact) -> Result<(), FactError> {
        let mut facts = self.facts.write().unwrap_or_else(PoisonError::into_inner);
        if facts.contains_key(&key) {
            return Err(FactError::AlreadyPublished(key));
        }
        facts.insert(key, Arc::new(fact));
        Ok(())
    }

    /// Look up the fact published for `key`, if any.
    pub fn lookup(&self, key: &SymbolKey) -> Option<Arc<StructFact>> {
        let facts = self.facts.read().unwrap_or_else(PoisonError::into_inner);
        facts.get(key).cloned()
    }

    /// Record that the type alias `alias` denotes `target`. Write-once, like
    /// facts.
    pub fn publish_alias(&self, alias: SymbolKey, target: SymbolKey) -> Result<(), FactError> {
        let mut aliases = self.aliases.write().unwrap_or_else(PoisonError::into_inner);
        if aliases.contains_key(&alias) {
            return Err(FactError::AliasExists(alias));
        }
        aliases.insert(alias, target);
        Ok(())
    }

    /// The symbol `key` denotes once recorded aliases are followed.
    pub fn resolve_alias(&self, key: &SymbolKey) -> SymbolKey {
        let aliases = self.aliases.read().unwrap_or_else(PoisonError::into_inner);
        let mut current = key;
        for _ in 0..MAX_ALIAS_DEPTH {
            match aliases.get(current) {
                Some(target) => current = target,
                None => break,
            }
        }
        current.clone()
    }

    /// Look up the fact for `key`, following recorded aliases first.
    pub fn lookup_resolved(&self, key: &SymbolKey) -> Option<Arc<StructFact>> {
        self.lookup(&self.resolve_alias(key))
    }

    pub fn len(&self) -> usize {
        self.facts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All published facts, sorted by key.
    pub fn snapshot(&self) -> Vec<PublishedFact> {
        let facts = self.facts.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<PublishedFact> = facts
            .iter()
            .map(|(symbol, fact)| PublishedFact {
                symbol: symbol.clone(),
                fields: fact.fields.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        out
    }

    /// Serialize every published fact as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

/// An import declaration of a Go file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The import path.
    pub path: String,
    /// Optional name (e.g., `import foo "bar"` -> alias is "foo", `.` for dot imports).
    pub alias: Option<String>,
    /// Source span.
    pub span: Span,
}

impl Import {
    pub fn is_dot(&self) -> bool {
        self.alias.as_deref() == Some(".")
    }

    pub fn is_blank(&self) -> bool {
        self.alias.as_deref() == Some("_")
    }
}

/// File-level facts used to group files into units and order them.
#[derive(Debug, Clone)]
pub struct FileFacts {
    /// File path.
    pub path: String,
    /// Package clause name.
    pub package: Option<String>,
    /// All imports in the file.
    pub imports: Vec<Import>,
    /// Whether the file had parse errors.
    pub has_parse_errors: bool,
}

impl FileFacts {
    /// Whether this file belongs to an external test package (`package foo_test`).
    pub fn is_external_test(&self) -> bool {
        self.package
            .as_deref()
            .map(|p| p.ends_with("_test"))
            .unwrap_or(false)
    }
}
