//! Identifier references across documents.

use crate::core::config::Config;
use crate::core::diagnostics::{DiagnosticKind, Diagnostics};
use crate::core::error::CanonError;
use crate::core::files;
use crate::core::ids;
use crate::core::markdown;
use std::collections::{BTreeMap, BTreeSet};

/// Identifier tokens in `md`'s prose; fenced blocks are ignored.
pub fn scan_references(md: &str) -> BTreeSet<String> {
    ids::find_ids(&markdown::strip_fences(md)).into_iter().collect()
}

/// References per document for each root-relative path in `docs`.
/// Documents that do not exist are skipped.
pub fn collect_references(
    config: &Config,
    docs: &[String],
) -> Result<BTreeMap<String, BTreeSet<String>>, CanonError> {
    let mut refs = BTreeMap::new();
    for rel in docs {
        let Some(md) = files::read_optional(&config.abs(rel))? else {
            tracing::debug!(path = %rel, "reference document absent; skipped");
            continue;
        };
        refs.insert(rel.clone(), scan_references(&md));
    }
    Ok(refs)
}

/// One error per (document, id) pair whose id is not in `known`.
pub fn check_references(
    refs: &BTreeMap<String, BTreeSet<String>>,
    known: &BTreeSet<String>,
    diags: &mut Diagnostics,
) {
    for (doc, found) in refs {
        for id in found.iter().filter(|id| !known.contains(*id)) {
            diags.error(
                DiagnosticKind::UnknownReference,
                format!("{}: references unknown ID {}", doc, id),
            );
        }
    }
}
