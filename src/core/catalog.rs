//! Catalog construction: every clause entry and decision record in the corpus.
//!
//! Structural problems (duplicates, missing status, unknown tags) are
//! collected in the returned [`Diagnostics`] and never stop extraction, so the
//! catalog always holds everything that was found. A missing canonical
//! document or an empty taxonomy aborts with [`CanonError`].

use crate::core::adr::{self, DecisionRecord};
use crate::core::config::Config;
use crate::core::diagnostics::{DiagnosticKind, Diagnostics};
use crate::core::entries::{self, Entry};
use crate::core::error::CanonError;
use crate::core::files;
use crate::core::taxonomy::{self, TagAllowlist};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub entries: Vec<Entry>,
    pub decision_records: Vec<DecisionRecord>,
}

impl Catalog {
    pub fn clause_ids(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.id.to_string()).collect()
    }

    /// Clause ids plus decision record ids: the set every reference resolves against.
    pub fn known_ids(&self) -> BTreeSet<String> {
        let mut ids = self.clause_ids();
        ids.extend(self.decision_records.iter().map(|r| r.id.to_string()));
        ids
    }
}

/// One row of the persisted machine-readable catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub prefix: String,
    pub number: u16,
    pub title: String,
    pub status: String,
    pub tags: Vec<String>,
    pub file: String,
    pub anchor: String,
    pub href: String,
    pub section: String,
}

impl From<&Entry> for CatalogRecord {
    fn from(e: &Entry) -> Self {
        Self {
            id: e.id.to_string(),
            prefix: e.prefix().to_string(),
            number: e.number(),
            title: e.title.clone(),
            status: e.status.clone(),
            tags: e.tags.clone(),
            file: e.file.clone(),
            anchor: e.anchor.clone(),
            href: e.href.clone(),
            section: e.section.clone(),
        }
    }
}

impl From<&DecisionRecord> for CatalogRecord {
    fn from(r: &DecisionRecord) -> Self {
        Self {
            id: r.id.to_string(),
            prefix: r.id.prefix.to_string(),
            number: r.number(),
            title: r.title.clone(),
            status: r.status.clone(),
            tags: Vec::new(),
            file: r.file.clone(),
            anchor: String::new(),
            href: r.href.clone(),
            section: String::new(),
        }
    }
}

/// Allowlist from the taxonomy document, `None` when the document is absent.
pub fn load_allowlist(config: &Config) -> Result<Option<TagAllowlist>, CanonError> {
    let rel = config.taxonomy_rel();
    let Some(md) = files::read_optional(&config.abs(&rel))? else {
        tracing::debug!(path = %rel, "no tag taxonomy; tags are not validated");
        return Ok(None);
    };
    let tags = taxonomy::parse_allowed_tags(&md);
    if tags.is_empty() {
        return Err(CanonError::EmptyTaxonomy(rel));
    }
    Ok(Some(TagAllowlist::new(rel, tags)))
}

/// Parse every canonical document and decision record under `config`.
pub fn build_catalog(config: &Config) -> Result<(Catalog, Diagnostics), CanonError> {
    let mut diags = Diagnostics::new();
    let allowlist = load_allowlist(config)?;

    let mut catalog = Catalog::default();
    for rel in config.canonical_doc_paths() {
        let Some(md) = files::read_optional(&config.abs(&rel))? else {
            return Err(CanonError::MissingCanonicalDoc(rel));
        };
        catalog
            .entries
            .extend(entries::parse_entries(&md, &rel, allowlist.as_ref(), &mut diags));
    }

    report_cross_file_duplicates(
        catalog.entries.iter().map(|e| (e.id.to_string(), e.file.as_str())),
        &mut diags,
    );

    catalog.decision_records = adr::collect_decision_records(config)?;
    report_cross_file_duplicates(
        catalog
            .decision_records
            .iter()
            .map(|r| (r.id.to_string(), r.file.as_str())),
        &mut diags,
    );
    tracing::info!(
        entries = catalog.entries.len(),
        decision_records = catalog.decision_records.len(),
        errors = diags.error_count(),
        "built catalog"
    );
    Ok((catalog, diags))
}

/// One error per id attached to more than one file, in id order. Takes
/// `(id, file)` pairs so clause entries and decision records share the check.
pub fn report_cross_file_duplicates<'a>(
    located: impl IntoIterator<Item = (String, &'a str)>,
    diags: &mut Diagnostics,
) {
    let mut files_by_id: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (id, file) in located {
        let files = files_by_id.entry(id).or_default();
        if !files.contains(&file) {
            files.push(file);
        }
    }
    for (id, files) in files_by_id.into_iter().filter(|(_, f)| f.len() > 1) {
        diags.error(
            DiagnosticKind::DuplicateId,
            format!(
                "duplicate ID across files: {} appears in [{}]",
                id,
                files.join(", ")
            ),
        );
    }
}

#[derive(Deserialize)]
struct PersistedId {
    id: String,
}

/// Known ids from the persisted catalog. `None` when it is absent,
/// unparseable, or empty; callers then skip existence checks.
pub fn load_known_ids(config: &Config) -> Option<BTreeSet<String>> {
    let rel = config.catalog_rel();
    let content = match files::read_optional(&config.abs(&rel)) {
        Ok(Some(c)) => c,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(path = %rel, error = %e, "could not read catalog");
            return None;
        }
    };
    match serde_json::from_str::<Vec<PersistedId>>(&content) {
        Ok(rows) if !rows.is_empty() => Some(rows.into_iter().map(|r| r.id).collect()),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(path = %rel, error = %e, "could not parse catalog");
            None
        }
    }
}
