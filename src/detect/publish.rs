//! Fact publisher: commits opted-in declarations to the shared fact store.

use tracing::{debug, warn};

use crate::analysis::{Pass, StructFact};

use super::StructDecl;

/// Publish one fact per declaration. Returns how many were committed.
///
/// A key that already carries a fact is left untouched and logged.
pub fn publish_facts(pass: &Pass<'_>, decls: &[StructDecl]) -> usize {
    let mut published = 0;
    for decl in decls {
        match pass.export_fact(decl.key.clone(), StructFact::new(decl.fields.clone())) {
            Ok(()) => {
                debug!(symbol = %decl.key, fields = decl.fields.len(), "fact published");
                published += 1;
            }
            Err(e) => warn!(file = %decl.file, at = %decl.span, error = %e, "fact not published"),
        }
    }
    published
}
