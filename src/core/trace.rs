//! Trace block validation for delivery artifacts (PR bodies and the like).
//!
//! A delivery artifact links itself to its originating issue, its spec, and
//! the clauses it satisfies through a sentinel fence:
//!
//! ~~~text
//! ```trace
//! Issue: #42
//! Spec: docs/specs/FS-0042-replay-cache.md
//! Constitution: INV-0001, AC-0003
//! ADRs: none
//! ```
//! ~~~
//!
//! The spec must point back at the same issue; that bidirectional agreement
//! is the heart of the check.

use crate::core::config::Config;
use crate::core::diagnostics::{DiagnosticKind, Diagnostics};
use crate::core::error::CanonError;
use crate::core::files;
use crate::core::ids;
use crate::core::markdown::Document;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::sync::LazyLock;

pub const TRACE_FENCE_INFO: &str = "trace";

/// Only this much of a spec is searched for its `issue:` field.
const SPEC_ISSUE_WINDOW: usize = 1000;

static ISSUE_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?(?P<num>\d+)$").unwrap());
static SPEC_ISSUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^issue:\s*#?(?P<num>\d+)\s*$").unwrap());
static TRIVIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^N/A:\s*trivial").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceBlock {
    /// Issue number, digits only.
    pub issue: Option<String>,
    pub spec: Option<String>,
    pub constitution: Vec<String>,
    pub adrs: Vec<String>,
}

impl TraceBlock {
    /// Whether `Spec:` uses the `N/A: trivial` escape.
    pub fn is_trivial(&self) -> bool {
        self.spec.as_deref().is_some_and(|s| TRIVIAL_RE.is_match(s))
    }
}

/// Parse the first closed ```` ```trace ```` fence. `None` when there is no
/// such fence or it is empty. Fields may appear in any order; the first
/// well-formed occurrence of each wins.
pub fn parse_trace_block(text: &str) -> Option<TraceBlock> {
    let doc = Document::parse(text);
    let fence = doc.fence_with_info(TRACE_FENCE_INFO)?;
    let body = doc.content_of(fence);
    if body.iter().all(|l| l.trim().is_empty()) {
        return None;
    }

    let mut trace = TraceBlock::default();
    let mut constitution_seen = false;
    let mut adrs_seen = false;
    for line in body {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key {
            "Issue" if trace.issue.is_none() => {
                trace.issue = ISSUE_VALUE_RE.captures(value).map(|c| c["num"].to_string());
            }
            "Spec" if trace.spec.is_none() && !value.is_empty() => {
                trace.spec = Some(value.to_string());
            }
            "Constitution" if !constitution_seen => {
                constitution_seen = true;
                trace.constitution = ids::find_ids(value);
            }
            "ADRs" if !adrs_seen => {
                adrs_seen = true;
                if !value.eq_ignore_ascii_case("none") {
                    trace.adrs = ids::find_ids(value);
                }
            }
            _ => {}
        }
    }
    Some(trace)
}

/// First spec named `<prefix>-<zero-padded issue>-*.md`, falling back to the
/// unpadded number. Returned root-relative.
pub fn find_spec_for_issue(config: &Config, issue: &str) -> Result<Option<String>, CanonError> {
    let dir = config.abs(&config.specs_dir);
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();

    let candidates = [
        format!("{}-{:0>4}-", config.spec_prefix, issue),
        format!("{}-{}-", config.spec_prefix, issue),
    ];
    for stem in &candidates {
        if let Some(name) = names
            .iter()
            .find(|n| n.starts_with(stem.as_str()) && n.ends_with(".md"))
        {
            return Ok(Some(config.rel(&dir.join(name))));
        }
    }
    Ok(None)
}

/// The `issue:` value near the top of a spec, digits only.
pub fn spec_issue(md: &str) -> Option<String> {
    let mut end = md.len().min(SPEC_ISSUE_WINDOW);
    while !md.is_char_boundary(end) {
        end -= 1;
    }
    SPEC_ISSUE_RE
        .captures(&md[..end])
        .map(|c| c["num"].to_string())
}

/// Validate the trace block in `text`.
///
/// `known_ids` is `None` when no catalog could be loaded; id existence is
/// then skipped with a notice instead of failing every reference.
pub fn validate_trace(
    text: &str,
    known_ids: Option<&BTreeSet<String>>,
    config: &Config,
) -> Result<Diagnostics, CanonError> {
    let mut diags = Diagnostics::new();

    let Some(trace) = parse_trace_block(text) else {
        diags.error(
            DiagnosticKind::MissingTraceBlock,
            "Missing trace block. Delivery text must contain a ```trace ... ``` sentinel block.",
        );
        return Ok(diags);
    };
    tracing::debug!(?trace, "parsed trace block");

    if trace.issue.is_none() {
        diags.error(
            DiagnosticKind::MissingTraceField,
            "Trace block missing 'Issue: #NNNN' field",
        );
    }
    if trace.spec.is_none() {
        diags.error(DiagnosticKind::MissingTraceField, "Trace block missing 'Spec:' field");
    }

    if let Some(issue) = trace.issue.as_deref() {
        let located = find_spec_for_issue(config, issue)?;
        match trace.spec.as_deref() {
            Some(_) if trace.is_trivial() => {
                if let Some(existing) = &located {
                    diags.warn(
                        DiagnosticKind::TrivialEscapeMisapplied,
                        format!(
                            "Spec marked as 'N/A: trivial' but spec exists for issue #{}: {}",
                            issue, existing
                        ),
                    );
                }
            }
            Some(spec) => {
                check_spec_backlink(config, issue, spec, &mut diags)?;
                if let Some(expected) = &located {
                    let declared = spec.replace('\\', "/");
                    if *expected != declared {
                        diags.warn(
                            DiagnosticKind::SpecPathMismatch,
                            format!(
                                "Spec for issue #{} exists at {}, but trace references {}",
                                issue, expected, spec
                            ),
                        );
                    }
                }
            }
            None => {
                if let Some(existing) = &located {
                    diags.error(
                        DiagnosticKind::SpecNotReferenced,
                        format!(
                            "Spec exists for issue #{} at {}, but Spec field is missing",
                            issue, existing
                        ),
                    );
                }
            }
        }
    }

    match known_ids {
        None => diags.notice(
            DiagnosticKind::CatalogUnavailable,
            "Could not load ID catalog; skipping ID validation",
        ),
        Some(known) => {
            for id in trace.constitution.iter().filter(|id| !known.contains(*id)) {
                diags.error(
                    DiagnosticKind::UnknownReference,
                    format!("Unknown Constitution ID: {}", id),
                );
            }
            for id in trace.adrs.iter().filter(|id| !known.contains(*id)) {
                diags.error(
                    DiagnosticKind::UnknownReference,
                    format!("Unknown ADR ID: {}", id),
                );
            }
        }
    }

    Ok(diags)
}

/// The declared spec must exist and declare the same issue number.
fn check_spec_backlink(
    config: &Config,
    issue: &str,
    spec: &str,
    diags: &mut Diagnostics,
) -> Result<(), CanonError> {
    let Some(md) = files::read_optional(&config.abs(spec))? else {
        diags.error(
            DiagnosticKind::SpecNotFound,
            format!("Spec file does not exist: {}", spec),
        );
        return Ok(());
    };
    match spec_issue(&md) {
        None => diags.error(
            DiagnosticKind::MissingSpecIssue,
            format!("Spec {} is missing 'issue:' in frontmatter", spec),
        ),
        Some(declared) if declared != issue => diags.error(
            DiagnosticKind::IssueMismatch,
            format!(
                "Issue mismatch: trace declares Issue: #{}, but spec {} declares issue: {}",
                issue, spec, declared
            ),
        ),
        Some(_) => {}
    }
    Ok(())
}
