//! Derived artifacts: the by-prefix index, the by-tag index, and the JSON catalog.
//!
//! All three are pure functions of the catalog and the layout, byte-for-byte
//! reproducible, so a fresh render can be compared with the persisted copy to
//! detect staleness.

use crate::core::catalog::{Catalog, CatalogRecord};
use crate::core::config::Config;
use crate::core::diagnostics::{DiagnosticKind, Diagnostics};
use crate::core::entries::Entry;
use crate::core::error::CanonError;
use crate::core::files;
use crate::core::ids::Prefix;
use std::collections::BTreeMap;

pub const GENERATOR_COMMAND: &str = "canonid generate --write";

const LINK_ONLY_NOTE: &str =
    "This index is link-only. All substance lives in the canonical Constitution documents.";

/// A generated file and the content it should have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Root-relative posix path.
    pub path: String,
    pub content: String,
}

fn banner(title: &str) -> Vec<String> {
    vec![
        format!("# {}", title),
        String::new(),
        "NOTE: This file is GENERATED. Do not edit manually.".to_string(),
        format!("Generator: `{}`", GENERATOR_COMMAND),
        String::new(),
        LINK_ONLY_NOTE.to_string(),
        String::new(),
    ]
}

fn entry_link(e: &Entry, index_dir: &str) -> String {
    format!(
        "- [{}]({}#{}) — {}",
        e.id,
        relative_link(index_dir, &e.file),
        e.anchor,
        e.title
    )
}

/// Links grouped by prefix, numerically ordered, then decision records.
pub fn render_id_index(catalog: &Catalog, config: &Config) -> String {
    let index_dir = config.constitution_dir.as_str();
    let mut by_prefix: BTreeMap<Prefix, Vec<&Entry>> = BTreeMap::new();
    for e in &catalog.entries {
        by_prefix.entry(e.prefix()).or_default().push(e);
    }

    let mut out = banner("Constitution ID Index");
    for prefix in Prefix::CLAUSES {
        let mut group = by_prefix.remove(&prefix).unwrap_or_default();
        group.sort_by_key(|e| e.number());

        let mut block = vec![format!("## {}", prefix.index_title()), String::new()];
        block.extend(group.iter().map(|e| entry_link(e, index_dir)));
        block.push(String::new());
        out.push(block.join("\n"));
    }

    if !catalog.decision_records.is_empty() {
        let mut records: Vec<_> = catalog.decision_records.iter().collect();
        records.sort_by_key(|r| r.number());

        let mut block = vec![format!("## {}", Prefix::Adr.index_title()), String::new()];
        block.extend(records.iter().map(|r| {
            format!("- [{}]({}) — {}", r.id, relative_link(index_dir, &r.file), r.title)
        }));
        block.push(String::new());
        out.push(block.join("\n"));
    }

    finish(out)
}

/// Links grouped under every tag they carry, tags alphabetical.
pub fn render_id_index_by_tag(catalog: &Catalog, config: &Config) -> String {
    let index_dir = config.constitution_dir.as_str();
    let mut by_tag: BTreeMap<&str, Vec<&Entry>> = BTreeMap::new();
    for e in &catalog.entries {
        for tag in &e.tags {
            by_tag.entry(tag.as_str()).or_default().push(e);
        }
    }

    let mut out = banner("Constitution ID Index by Tag");
    for (tag, mut group) in by_tag {
        group.sort_by_key(|e| e.id);
        out.push(format!("## {}", tag));
        out.push(String::new());
        out.extend(group.iter().map(|e| entry_link(e, index_dir)));
        out.push(String::new());
    }

    finish(out)
}

/// Every entry sorted by (prefix, number), then every decision record by number.
/// Records trail the clause entries rather than sorting in among them by prefix.
pub fn render_catalog(catalog: &Catalog) -> Result<String, CanonError> {
    let mut entries: Vec<&Entry> = catalog.entries.iter().collect();
    entries.sort_by_key(|e| e.id);
    let mut records: Vec<CatalogRecord> = entries.into_iter().map(CatalogRecord::from).collect();

    let mut decisions: Vec<_> = catalog.decision_records.iter().collect();
    decisions.sort_by_key(|r| r.number());
    records.extend(decisions.into_iter().map(CatalogRecord::from));

    let mut json = serde_json::to_string_pretty(&records)?;
    json.push('\n');
    Ok(json)
}

fn finish(lines: Vec<String>) -> String {
    let mut text = lines.join("\n").trim_end().to_string();
    text.push('\n');
    text
}

/// All three artifacts at their configured paths.
pub fn render_all(catalog: &Catalog, config: &Config) -> Result<Vec<Artifact>, CanonError> {
    Ok(vec![
        Artifact {
            path: config.id_index_rel(),
            content: render_id_index(catalog, config),
        },
        Artifact {
            path: config.id_index_by_tag_rel(),
            content: render_id_index_by_tag(catalog, config),
        },
        Artifact {
            path: config.catalog_rel(),
            content: render_catalog(catalog)?,
        },
    ])
}

/// One error listing every artifact whose persisted content differs.
/// A missing file compares as empty.
pub fn check_generated(
    config: &Config,
    artifacts: &[Artifact],
    diags: &mut Diagnostics,
) -> Result<(), CanonError> {
    let mut stale = Vec::new();
    for artifact in artifacts {
        let current = files::read_optional(&config.abs(&artifact.path))?.unwrap_or_default();
        if current != artifact.content {
            stale.push(artifact.path.as_str());
        }
    }
    if !stale.is_empty() {
        let listing: Vec<String> = stale.iter().map(|p| format!("  - {}", p)).collect();
        diags.error(
            DiagnosticKind::StaleArtifact,
            format!(
                "generated files are out of date:\n{}\nRun: {}",
                listing.join("\n"),
                GENERATOR_COMMAND
            ),
        );
    }
    Ok(())
}

/// Persist artifacts that changed. Returns whether anything was written.
pub fn write_artifacts(config: &Config, artifacts: &[Artifact]) -> Result<bool, CanonError> {
    let mut any_changed = false;
    for artifact in artifacts {
        any_changed |= files::write_if_changed(&config.abs(&artifact.path), &artifact.content)?;
    }
    Ok(any_changed)
}

/// Relative markdown link from a directory to a file, both root-relative.
/// Same-directory targets get a `./` prefix.
pub fn relative_link(from_dir: &str, to_file: &str) -> String {
    let from: Vec<&str> = from_dir
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();
    let to: Vec<&str> = to_file
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let ups = from.len() - common;
    let rest = to[common..].join("/");
    if ups == 0 {
        format!("./{}", rest)
    } else {
        format!("{}{}", "../".repeat(ups), rest)
    }
}
