//! Analysis context: unit discovery, import ordering, and the pass driver.
//!
//! The AnalysisContext provides:
//! - Grouping of parsed files into units by directory and package clause
//! - Scheduling of units so that dependencies finish first
//! - The shared fact store every pass reads and writes

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rayon::prelude::*;
use tracing::{debug, debug_span, warn};

use crate::analysis::{
    get_analyzer, Analyzer, Diagnostic, FactStore, PackageNames, Pass, SourceFile, Unit,
};
use crate::error::HostError;

/// Read the module path declared in `<dir>/go.mod`.
pub fn read_module_path(dir: &Path) -> Option<String> {
    let content = fs::read_to_string(dir.join("go.mod")).ok()?;
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_string())
    })
}

/// Import path of `dir` inside the module rooted at `root`.
fn module_prefix(module: &str, root: &Path, dir: &Path) -> String {
    let abs = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let rel = abs.strip_prefix(root).unwrap_or(Path::new(""));
    let rel = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if rel.is_empty() {
        module.to_string()
    } else {
        format!("{}/{}", module, rel)
    }
}

/// Find the module enclosing `dir`: the nearest `go.mod` in `dir` or one of
/// its ancestors. Returns the module path and the module root.
pub fn find_module(dir: &Path) -> Option<(String, PathBuf)> {
    let abs = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    abs.ancestors()
        .find_map(|root| read_module_path(root).map(|module| (module, root.to_path_buf())))
}

/// Analysis context for a tree of Go packages.
pub struct AnalysisContext {
    /// Base directory for relative path resolution.
    base_dir: PathBuf,
    /// Module path declared for the tree.
    module_path: String,
    /// Import path of the base directory; prefixes every unit's import path.
    import_prefix: String,
    units: Vec<Unit>,
    facts: FactStore,
}

impl AnalysisContext {
    /// Create a new analysis context.
    ///
    /// An explicit module path makes the base directory the module root.
    /// Otherwise the nearest enclosing `go.mod` decides, and the base
    /// directory's place inside that module is kept in its import path. With
    /// no `go.mod` at all the name of the base directory is used.
    pub fn new<P: AsRef<Path>>(base_dir: P, module: Option<String>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let (module_path, import_prefix) = match module {
            Some(module) => (module.clone(), module),
            None => match find_module(&base_dir) {
                Some((module, root)) => {
                    let prefix = module_prefix(&module, &root, &base_dir);
                    (module, prefix)
                }
                None => {
                    let abs = base_dir.canonicalize().unwrap_or_else(|_| base_dir.clone());
                    let name = abs
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "main".to_string());
                    (name.clone(), name)
                }
            },
        };
        debug!(module = %module_path, prefix = %import_prefix, "analysis context created");

        Self {
            base_dir,
            module_path,
            import_prefix,
            units: Vec::new(),
            facts: FactStore::new(),
        }
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    pub fn import_prefix(&self) -> &str {
        &self.import_prefix
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    /// Add a unit built elsewhere.
    pub fn add_unit(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    /// Import path of the package in `rel_dir`. Packages under `vendor/` keep
    /// the import path they are vendored as.
    fn import_path_for(&self, rel_dir: &str) -> String {
        if let Some(vendored) = rel_dir.strip_prefix("vendor/") {
            return vendored.to_string();
        }
        if rel_dir.is_empty() {
            self.import_prefix.clone()
        } else {
            format!("{}/{}", self.import_prefix, rel_dir)
        }
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn parse_file(&self, path: &Path) -> anyhow::Result<Option<(String, SourceFile)>> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let Some(analyzer) = get_analyzer(ext) else {
            return Ok(None);
        };

        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        let source = fs::read(&abs_path).map_err(|source| HostError::Io {
            path: abs_path.clone(),
            source,
        })?;
        let parsed = analyzer.parse(&abs_path, &source)?;
        let facts = analyzer.extract_facts(&parsed)?;

        let rel_path = self.relative_path(&abs_path);
        let Some(package) = facts.package else {
            warn!(file = %rel_path, "no package clause, skipping");
            return Ok(None);
        };
        Ok(Some((package, SourceFile::new(parsed, rel_path, facts.imports))))
    }

    /// Parse `paths` and group them into units.
    ///
    /// Files that cannot be read or parsed are logged and skipped. Returns the
    /// number of files loaded.
    pub fn load_files(&mut self, paths: &[PathBuf]) -> usize {
        let this = &*self;
        let results: Vec<_> = paths.par_iter().map(|p| (p, this.parse_file(p))).collect();

        // (dir, package) -> files
        let mut groups: BTreeMap<(String, String), Vec<SourceFile>> = BTreeMap::new();
        let mut loaded = 0;
        for (path, result) in results {
            match result {
                Ok(Some((package, file))) => {
                    if file.parsed.has_errors() {
                        warn!(file = %file.rel_path, "file has syntax errors, analyzing the partial tree");
                    }
                    let dir = match file.rel_path.rsplit_once('/') {
                        Some((dir, _)) => dir.to_string(),
                        None => String::new(),
                    };
                    groups.entry((dir, package)).or_default().push(file);
                    loaded += 1;
                }
                Ok(None) => {}
                Err(e) => warn!(file = %path.display(), error = %e, "failed to load file"),
            }
        }

        let groups = self.drop_conflicting_packages(groups);

        let mut names: PackageNames = self
            .units
            .iter()
            .map(|u| (u.import_path.clone(), u.package.clone()))
            .collect();
        for (dir, package) in groups.keys() {
            if !package.ends_with("_test") {
                names.insert(self.import_path_for(dir), package.clone());
            }
        }
        let names = Arc::new(names);

        for ((dir, package), mut files) in groups {
            files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
            let mut import_path = self.import_path_for(&dir);
            if package.ends_with("_test") {
                import_path.push_str("_test");
            }
            debug!(unit = %import_path, files = files.len(), "unit discovered");
            self.units
                .push(Unit::new(import_path, package, dir, files, Arc::clone(&names)));
        }

        loaded
    }

    /// Keep one non-test package per directory: the one with the most files.
    fn drop_conflicting_packages(
        &self,
        groups: BTreeMap<(String, String), Vec<SourceFile>>,
    ) -> BTreeMap<(String, String), Vec<SourceFile>> {
        let mut primary: HashMap<&str, (&str, usize)> = HashMap::new();
        for ((dir, package), files) in &groups {
            if package.ends_with("_test") {
                continue;
            }
            let entry = primary.entry(dir.as_str()).or_insert((package.as_str(), 0));
            if files.len() > entry.1 {
                *entry = (package.as_str(), files.len());
            }
        }
        let primary: HashMap<String, String> = primary
            .into_iter()
            .map(|(dir, (package, _))| (dir.to_string(), package.to_string()))
            .collect();

        groups
            .into_iter()
            .filter(|((dir, package), files)| {
                if package.ends_with("_test") || primary.get(dir) == Some(package) {
                    return true;
                }
                warn!(
                    dir = %dir,
                    package = %package,
                    files = files.len(),
                    "multiple packages in one directory, skipping"
                );
                false
            })
            .collect()
    }

    /// Order units into waves.
    ///
    /// Every unit in a wave only imports units of earlier waves. Imports of
    /// packages outside the analyzed tree are ignored.
    pub fn schedule(&self) -> Result<Vec<Vec<usize>>, HostError> {
        let index: HashMap<&str, usize> = self
            .units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.import_path.as_str(), i))
            .collect();

        let mut indegree = vec![0usize; self.units.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.units.len()];
        for (i, unit) in self.units.iter().enumerate() {
            for path in unit.imported_paths() {
                if let Some(&dep) = index.get(path) {
                    if dep != i {
                        indegree[i] += 1;
                        dependents[dep].push(i);
                    }
                }
            }
        }

        let mut waves = Vec::new();
        let mut ready: Vec<usize> = (0..self.units.len()).filter(|&i| indegree[i] == 0).collect();
        let mut done = 0;
        while !ready.is_empty() {
            ready.sort_by(|&a, &b| self.units[a].import_path.cmp(&self.units[b].import_path));
            let mut next = Vec::new();
            for &i in &ready {
                for &d in &dependents[i] {
                    indegree[d] -= 1;
                    if indegree[d] == 0 {
                        next.push(d);
                    }
                }
            }
            done += ready.len();
            waves.push(std::mem::replace(&mut ready, next));
        }

        if done < self.units.len() {
            let mut cycle: Vec<String> = indegree
                .iter()
                .enumerate()
                .filter(|(_, n)| **n > 0)
                .map(|(i, _)| self.units[i].import_path.clone())
                .collect();
            cycle.sort();
            return Err(HostError::ImportCycle(cycle));
        }

        Ok(waves)
    }

    /// Run `analyzers` over every unit, dependencies first.
    pub fn run(&self, analyzers: &[&Analyzer], parallel: bool) -> anyhow::Result<Vec<Diagnostic>> {
        let waves = self.schedule()?;
        let mut diagnostics = Vec::new();

        for (n, wave) in waves.iter().enumerate() {
            debug!(wave = n, units = wave.len(), "analyzing wave");
            let results: Vec<anyhow::Result<Vec<Diagnostic>>> = if parallel {
                wave.par_iter()
                    .map(|&i| self.analyze_unit(&self.units[i], analyzers))
                    .collect()
            } else {
                wave.iter()
                    .map(|&i| self.analyze_unit(&self.units[i], analyzers))
                    .collect()
            };
            for result in results {
                diagnostics.extend(result?);
            }
        }

        Ok(diagnostics)
    }

    fn analyze_unit(&self, unit: &Unit, analyzers: &[&Analyzer]) -> anyhow::Result<Vec<Diagnostic>> {
        let span = debug_span!("unit", path = %unit.import_path);
        let _enter = span.enter();

        for (alias, target) in unit.types.aliases(&unit.import_path) {
            if let Err(e) = self.facts.publish_alias(alias, target) {
                warn!(error = %e, "alias not recorded");
            }
        }

        let mut diagnostics = Vec::new();
        for &analyzer in analyzers {
            let mut pass = Pass::new(analyzer, unit, &self.facts, &mut diagnostics);
            (analyzer.run)(&mut pass).with_context(|| {
                format!("analyzer {} failed on {}", analyzer.name, unit.import_path)
            })?;
        }
        if unit.is_vendored() {
            debug!(dropped = diagnostics.len(), "vendored unit, diagnostics dropped");
            diagnostics.clear();
        }
        debug!(diagnostics = diagnostics.len(), "unit analyzed");
        Ok(diagnostics)
    }
}
