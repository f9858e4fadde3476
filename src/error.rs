//! Host-level errors.
//!
//! These cover problems with the input tree itself. Resolution gaps inside
//! the analysis are never errors; they only cause a literal to be skipped.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("import cycle not allowed: {}", .0.join(", "))]
    ImportCycle(Vec<String>),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("no Go files to analyze under {}", .0.display())]
    NoSources(PathBuf),
}
