//! The exhauststruct analyzer.
//!
//! Each unit is processed in two phases: opted-in struct declarations are
//! scanned and published as facts, then every literal of the unit is checked
//! against the facts visible so far (its own and those of imported units).

mod literals;
mod publish;
mod runner;
mod scanner;
mod suppress;
mod types;

use tracing::debug;

use crate::analysis::{Analyzer, Pass};

pub use literals::{check_unit, literal_form, missing_fields, LiteralForm};
pub use publish::publish_facts;
pub use runner::Runner;
pub use scanner::{doc_comments, is_sentinel, scan_file, scan_unit, struct_fields, StructDecl, SENTINEL};
pub use suppress::{
    collect_suppressions, filter_suppressed, matches_suppression, parse_suppressions,
    SuppressedDiagnostic, Suppression, SuppressionType,
};
pub use types::CheckResult;

/// Analyzer descriptor registered with the plugin surface.
pub static ANALYZER: Analyzer = Analyzer {
    name: "exhauststruct",
    doc: "it checks that all struct fields are initialized",
    run,
};

fn run(pass: &mut Pass<'_>) -> anyhow::Result<()> {
    let decls = scan_unit(pass.unit)?;
    let published = publish_facts(pass, &decls);
    let reported = check_unit(pass);
    debug!(
        unit = %pass.unit.import_path,
        declarations = decls.len(),
        published,
        reported,
        "exhauststruct done"
    );
    Ok(())
}
