//! Configuration file schema for exhauststruct.
//!
//! The config is optional. When present it tunes discovery and scheduling;
//! which structs are checked is decided by the source itself.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Default config file names, searched in the analyzed root.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["exhauststruct.yaml", ".exhauststruct.yaml"];

/// Top-level config definition.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Module path override (default: from go.mod)
    #[serde(default)]
    pub module: Option<String>,
    /// Whether to include `_test.go` files in analysis (default: false)
    #[serde(default)]
    pub include_tests: Option<bool>,
    /// Glob patterns for paths to exclude from analysis (e.g., "**/gen/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Analyze independent packages in parallel (default: true)
    #[serde(default)]
    pub parallel: Option<bool>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| HostError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        validate(&config)?;
        Ok(config)
    }

    /// Load the config found in `root`, or the default config if none exists.
    pub fn discover(root: &Path) -> anyhow::Result<Self> {
        match find_config(root) {
            Some(path) => Self::parse_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Returns whether to include test files (defaults to false).
    pub fn should_include_tests(&self) -> bool {
        self.include_tests.unwrap_or(false)
    }

    /// Returns whether to analyze in parallel (defaults to true).
    pub fn is_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }
}

/// Find a config file in `root`.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Validate a config for correctness.
pub fn validate(config: &Config) -> Result<(), HostError> {
    if let Some(module) = &config.module {
        if module.trim().is_empty() || module.contains(char::is_whitespace) {
            return Err(HostError::InvalidConfig(format!(
                "invalid module path {:?}",
                module
            )));
        }
    }

    // excluded_paths glob patterns must compile
    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern).map_err(|e| {
            HostError::InvalidConfig(format!("invalid excluded_paths pattern {:?}: {}", pattern, e))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
module: example.com/demo
include_tests: true
excluded_paths:
  - "**/gen/**"
parallel: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.module.as_deref(), Some("example.com/demo"));
        assert!(config.should_include_tests());
        assert!(!config.is_parallel());
        assert!(config.is_path_excluded(Path::new("internal/gen/types.go")));
        assert!(!config.is_path_excluded(Path::new("internal/types.go")));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.should_include_tests());
        assert!(config.is_parallel());
        assert!(config.module.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_glob() {
        let config = Config {
            excluded_paths: vec!["a/[".to_string()],
            ..Default::default()
        };
        assert!(matches!(validate(&config), Err(HostError::InvalidConfig(_))));

        let config = Config {
            module: Some("example.com/my module".to_string()),
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        assert!(Config::discover(temp.path()).unwrap().module.is_none());

        fs::write(temp.path().join(".exhauststruct.yaml"), "module: m\n").unwrap();
        let config = Config::discover(temp.path()).unwrap();
        assert_eq!(config.module.as_deref(), Some("m"));
    }
}
