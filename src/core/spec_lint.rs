//! Spec document linting: frontmatter, required sections, the Tier 0 gate
//! plan, identifier references, and unresolved `NEW:` concepts.

use crate::core::config::Config;
use crate::core::diagnostics::{DiagnosticKind, Diagnostics};
use crate::core::error::CanonError;
use crate::core::files;
use crate::core::ids;
use crate::core::markdown::{BlockKind, Document};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const REQUIRED_SECTIONS: [&str; 7] = [
    "Problem",
    "Trace Map",
    "Domain Concepts",
    "Interfaces",
    "Determinism Notes",
    "Gate Plan",
    "Acceptance Criteria",
];

pub const REQUIRED_FRONTMATTER: [&str; 3] = ["status", "issue", "title"];

pub const VALID_STATUSES: [&str; 3] = ["Draft", "Approved", "Implemented"];

/// Statuses at which an unresolved `NEW:` concept is an error, not a warning.
const GATED_STATUSES: [&str; 2] = ["Approved", "Implemented"];

const GATE_PLAN: &str = "Gate Plan";

static NEW_CONCEPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bNEW:\s*(?P<concept>\w+)").unwrap());
static TIER0_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^tier\s+0\b").unwrap());
static CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*]\s+\[.\]").unwrap());

/// Lint one spec's content. `label` prefixes every message (usually the
/// root-relative path).
pub fn lint_spec(md: &str, label: &str, known_ids: Option<&BTreeSet<String>>) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let doc = Document::parse(md);

    let frontmatter = doc.frontmatter().filter(|fm| !fm.is_empty());
    match &frontmatter {
        None => diags.error(
            DiagnosticKind::MissingFrontmatter,
            format!("{}: Missing YAML frontmatter", label),
        ),
        Some(fm) => {
            for field in REQUIRED_FRONTMATTER {
                if fm.get(field).is_none_or(|v| v.is_empty()) {
                    diags.error(
                        DiagnosticKind::MissingFrontmatterField,
                        format!("{}: Missing frontmatter field: {}", label, field),
                    );
                }
            }
            if let Some(status) = fm.get("status").filter(|s| !s.is_empty())
                && !VALID_STATUSES.contains(&status.as_str())
            {
                diags.error(
                    DiagnosticKind::InvalidStatus,
                    format!(
                        "{}: Invalid status '{}' (must be one of: {})",
                        label,
                        status,
                        VALID_STATUSES.join(", ")
                    ),
                );
            }
        }
    }

    let sections = doc.sections(2);
    for name in REQUIRED_SECTIONS {
        match sections.iter().find(|s| s.title == name) {
            None => diags.error(
                DiagnosticKind::MissingSection,
                format!("{}: Missing required section: ## {}", label, name),
            ),
            Some(section) if doc.section_text(section).is_empty() => diags.error(
                DiagnosticKind::EmptySection,
                format!("{}: Section '## {}' is empty", label, name),
            ),
            Some(_) => {}
        }
    }

    if let Some(gate_plan) = sections.iter().find(|s| s.title == GATE_PLAN) {
        let tier0 = doc
            .sections_in(gate_plan.body.clone(), 3)
            .into_iter()
            .find(|s| TIER0_RE.is_match(s.title));
        match tier0 {
            None => diags.error(
                DiagnosticKind::MissingTier0,
                format!("{}: Gate Plan must include '### Tier 0' subsection", label),
            ),
            Some(tier0) => {
                let has_checkbox = doc.blocks()[tier0.body.clone()]
                    .iter()
                    .filter(|b| b.kind == BlockKind::Text)
                    .flat_map(|b| doc.lines_of(b).iter())
                    .any(|line| CHECKBOX_RE.is_match(line));
                if !has_checkbox {
                    diags.error(
                        DiagnosticKind::EmptyTier0,
                        format!(
                            "{}: Tier 0 gate plan must have at least one bullet item",
                            label
                        ),
                    );
                }
            }
        }
    }

    let prose = doc.text_outside_fences();
    match known_ids {
        Some(known) => {
            let referenced: BTreeSet<String> = ids::find_ids(&prose).into_iter().collect();
            for id in referenced.iter().filter(|id| !known.contains(*id)) {
                diags.error(
                    DiagnosticKind::UnknownReference,
                    format!("{}: References unknown ID: {}", label, id),
                );
            }
        }
        None => tracing::debug!(spec = label, "no catalog; reference check skipped"),
    }

    let status = frontmatter
        .as_ref()
        .and_then(|fm| fm.get("status").cloned())
        .unwrap_or_else(|| "Draft".to_string());
    let gated = GATED_STATUSES.contains(&status.as_str());
    for caps in NEW_CONCEPT_RE.captures_iter(&prose) {
        let concept = &caps["concept"];
        if gated {
            diags.error(
                DiagnosticKind::UnresolvedConcept,
                format!(
                    "{}: Status is '{}' but contains unresolved 'NEW: {}' (must resolve to DM-* before approval)",
                    label, status, concept
                ),
            );
        } else {
            diags.warn(
                DiagnosticKind::UnresolvedConcept,
                format!(
                    "{}: Draft spec contains 'NEW: {}' (resolve before approval)",
                    label, concept
                ),
            );
        }
    }

    diags
}

/// Read and lint one spec file. Unreadable files are reported, not fatal.
pub fn lint_spec_file(
    config: &Config,
    path: &Path,
    known_ids: Option<&BTreeSet<String>>,
) -> Diagnostics {
    let label = config.rel(path);
    match files::read_text(path) {
        Ok(md) => {
            tracing::debug!(spec = %label, "linting spec");
            lint_spec(&md, &label, known_ids)
        }
        Err(e) => {
            let mut diags = Diagnostics::new();
            diags.error(
                DiagnosticKind::Unreadable,
                format!("{}: Cannot read file: {}", label, e),
            );
            diags
        }
    }
}

fn is_spec_candidate(config: &Config, path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".md") && !config.spec_skip.iter().any(|s| s == name)
}

/// Every lintable spec in the specs directory, sorted.
pub fn all_specs(config: &Config) -> Result<Vec<PathBuf>, CanonError> {
    let dir = config.abs(&config.specs_dir);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut specs = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() && is_spec_candidate(config, &path) {
            specs.push(path);
        }
    }
    specs.sort();
    Ok(specs)
}

/// Restrict root-relative changed paths to existing, lintable specs.
pub fn changed_specs(config: &Config, changed: &[String]) -> Vec<PathBuf> {
    let specs_prefix = format!("{}/", config.specs_dir.trim_end_matches('/'));
    let mut specs: Vec<PathBuf> = changed
        .iter()
        .filter(|rel| rel.starts_with(&specs_prefix))
        .map(|rel| config.abs(rel))
        .filter(|p| p.is_file() && is_spec_candidate(config, p))
        .collect();
    specs.sort();
    specs.dedup();
    specs
}
