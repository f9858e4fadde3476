//! Compilation units.
//!
//! A unit is one Go package: the files of a directory that share a package
//! clause. Units are the granularity at which passes run and facts flow.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use tree_sitter::Node;

use super::languages::go_analyzer;
use super::resolve::TypeTable;
use super::{Import, LanguageAnalyzer, ParsedFile};

/// Maps import paths of known packages to their declared package names.
pub type PackageNames = HashMap<String, String>;

/// A parsed file of a unit together with its import table.
pub struct SourceFile {
    pub parsed: ParsedFile,
    /// Path relative to the analyzed root, `/`-separated.
    pub rel_path: String,
    pub imports: Vec<Import>,
}

impl SourceFile {
    pub fn new(parsed: ParsedFile, rel_path: impl Into<String>, imports: Vec<Import>) -> Self {
        Self {
            parsed,
            rel_path: rel_path.into(),
            imports,
        }
    }

    pub fn root(&self) -> Node<'_> {
        self.parsed.tree.root_node()
    }

    pub fn text(&self, node: Node) -> &str {
        self.parsed.node_text(node)
    }

    /// Resolve a package qualifier (`pkg` in `pkg.Type`) to an import path.
    ///
    /// Explicit import names win; otherwise the declared package name is used
    /// when the imported package is known, falling back to the conventional
    /// name derived from the import path.
    pub fn resolve_qualifier(&self, qualifier: &str, known: &PackageNames) -> Option<&str> {
        self.imports
            .iter()
            .find(|import| match import.alias.as_deref() {
                Some(alias) => alias == qualifier,
                None => {
                    let name = known
                        .get(&import.path)
                        .map(String::as_str)
                        .unwrap_or_else(|| default_package_name(&import.path));
                    name == qualifier
                }
            })
            .map(|import| import.path.as_str())
    }

    /// Import paths brought in with `import . "path"`.
    pub fn dot_imports(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|i| i.is_dot())
            .map(|i| i.path.as_str())
    }
}

/// Conventional package name for an import path: its last element, ignoring
/// a major version suffix (`/v2`) and a gopkg.in style `.vN` suffix.
pub fn default_package_name(import_path: &str) -> &str {
    let mut segments = import_path.rsplit('/');
    let last = segments.next().unwrap_or(import_path);
    let last = if is_major_version(last) {
        segments.next().unwrap_or(last)
    } else {
        last
    };
    match last.rsplit_once(".v") {
        Some((name, version))
            if !name.is_empty() && !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) => name,
        _ => last,
    }
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// One Go package ready for analysis.
pub struct Unit {
    /// Import path (module path joined with the package directory).
    pub import_path: String,
    /// Package clause name.
    pub package: String,
    /// Directory relative to the analyzed root.
    pub dir: String,
    pub files: Vec<SourceFile>,
    /// Package-level type declarations, for resolving literal types.
    pub types: TypeTable,
    package_names: Arc<PackageNames>,
}

impl Unit {
    pub fn new(
        import_path: impl Into<String>,
        package: impl Into<String>,
        dir: impl Into<String>,
        files: Vec<SourceFile>,
        package_names: Arc<PackageNames>,
    ) -> Self {
        let import_path = import_path.into();
        let types = TypeTable::build(&files, &package_names);
        Self {
            import_path,
            package: package.into(),
            dir: dir.into(),
            files,
            types,
            package_names,
        }
    }

    /// Build a unit from in-memory sources.
    ///
    /// The package name is taken from the first file's package clause.
    pub fn from_sources(import_path: &str, sources: &[(&str, &str)]) -> anyhow::Result<Self> {
        let analyzer = go_analyzer();
        let mut files = Vec::with_capacity(sources.len());
        let mut package = None;

        for (name, source) in sources {
            let parsed = analyzer.parse(Path::new(name), source.as_bytes())?;
            let facts = analyzer.extract_facts(&parsed)?;
            if package.is_none() {
                package = facts.package.clone();
            }
            files.push(SourceFile::new(parsed, *name, facts.imports));
        }

        let package = package
            .ok_or_else(|| anyhow::anyhow!("no package clause in sources for {}", import_path))?;
        let dir = import_path.rsplit('/').next().unwrap_or(import_path).to_string();
        Ok(Self::new(
            import_path,
            package,
            dir,
            files,
            Arc::new(PackageNames::new()),
        ))
    }

    pub fn package_names(&self) -> &PackageNames {
        &self.package_names
    }

    /// Whether the unit is a vendored dependency. Vendored units publish
    /// facts but their own diagnostics are not reported.
    pub fn is_vendored(&self) -> bool {
        self.dir == "vendor" || self.dir.starts_with("vendor/")
    }

    /// Every import path referenced by the unit's files.
    pub fn imported_paths(&self) -> BTreeSet<&str> {
        self.files
            .iter()
            .flat_map(|f| f.imports.iter())
            .filter(|i| !i.is_blank())
            .map(|i| i.path.as_str())
            .collect()
    }
}
