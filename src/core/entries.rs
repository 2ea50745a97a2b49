//! Clause entries extracted from one canonical document.
//!
//! A clause is defined by a heading carrying an anchor marker:
//!
//! ```text
//! ## Replay
//! ### <a id="INV-0001"></a> INV-0001 — Replay is deterministic
//! **Status:** Active
//! **Tags:** determinism, replay
//! ```
//!
//! Status and tags are read from the text following the heading, up to the
//! next heading and at most [`METADATA_WINDOW`] lines.

use crate::core::diagnostics::{DiagnosticKind, Diagnostics};
use crate::core::ids::{self, ClauseId, Prefix};
use crate::core::markdown::{BlockKind, Document};
use crate::core::taxonomy::TagAllowlist;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Lines after an anchored heading searched for `**Status:**` / `**Tags:**`.
pub const METADATA_WINDOW: usize = 12;

pub const UNTITLED: &str = "<Untitled>";

static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\*\*Status:\*\*\s*(?P<status>.+?)\s*$").unwrap());
static TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\*\*Tags:\*\*\s*(?P<tags>.+?)\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: ClauseId,
    pub title: String,
    pub status: String,
    pub tags: Vec<String>,
    /// Repository-relative posix path of the defining document.
    pub file: String,
    pub anchor: String,
    pub href: String,
    /// Nearest preceding H2, or empty.
    pub section: String,
}

impl Entry {
    pub fn prefix(&self) -> Prefix {
        self.id.prefix
    }

    pub fn number(&self) -> u16 {
        self.id.number
    }
}

/// Entries defined in `md`, in document order.
///
/// A repeated anchor is reported and dropped; the first definition stays.
/// Missing status and tags outside `allowlist` are reported per entry.
pub fn parse_entries(
    md: &str,
    file: &str,
    allowlist: Option<&TagAllowlist>,
    diags: &mut Diagnostics,
) -> Vec<Entry> {
    let doc = Document::parse(md);
    let blocks = doc.blocks();

    let mut entries = Vec::new();
    let mut section = "";
    let mut seen: BTreeSet<ClauseId> = BTreeSet::new();

    for (idx, block) in blocks.iter().enumerate() {
        let BlockKind::Heading { level, text } = block.kind else {
            continue;
        };
        if level == 2 {
            section = text;
        }
        let Some(raw_id) = ids::find_anchor(text) else {
            continue;
        };
        let Ok(id) = raw_id.parse::<ClauseId>() else {
            continue;
        };
        if !seen.insert(id) {
            diags.error(
                DiagnosticKind::DuplicateAnchor,
                format!("{}: duplicate ID anchor found for {}", file, id),
            );
            continue;
        }

        let (status, tags) = {
            let mut status: Option<String> = None;
            let mut tags: Option<Vec<String>> = None;
            let metadata_lines = blocks[idx + 1..]
                .iter()
                .take_while(|b| !matches!(b.kind, BlockKind::Heading { .. }))
                .filter(|b| b.kind == BlockKind::Text)
                .flat_map(|b| doc.lines_of(b).iter())
                .take(METADATA_WINDOW);
            for line in metadata_lines {
                let line = line.trim();
                if status.is_none()
                    && let Some(c) = STATUS_RE.captures(line)
                {
                    status = Some(c["status"].trim().to_string());
                }
                if tags.is_none()
                    && let Some(c) = TAGS_RE.captures(line)
                {
                    tags = Some(parse_tag_list(&c["tags"]));
                }
            }
            (status.unwrap_or_default(), tags.unwrap_or_default())
        };

        if status.is_empty() {
            diags.error(
                DiagnosticKind::MissingStatus,
                format!("{}: {} is missing **Status:**", file, id),
            );
        }
        if let Some(allowlist) = allowlist {
            for tag in tags.iter().filter(|t| !allowlist.contains(t)) {
                diags.error(
                    DiagnosticKind::UnknownTag,
                    format!(
                        "{}: {} uses unknown tag '{}' (not in {} allowlist)",
                        file,
                        id,
                        tag,
                        allowlist.source_name()
                    ),
                );
            }
        }

        let anchor = id.to_string();
        entries.push(Entry {
            id,
            title: clean_title(text, &anchor),
            status,
            tags,
            file: file.to_string(),
            href: format!("{}#{}", file, anchor),
            anchor,
            section: section.to_string(),
        });
    }

    tracing::debug!(file, entries = entries.len(), "parsed canonical document");
    entries
}

/// Heading text minus the anchor marker, the id itself, and one leading dash.
fn clean_title(heading: &str, id: &str) -> String {
    let cleaned = ids::remove_anchors(heading);
    let cleaned = cleaned.trim();
    let cleaned = cleaned.strip_prefix(id).unwrap_or(cleaned).trim();
    let cleaned = cleaned
        .strip_prefix('—')
        .or_else(|| cleaned.strip_prefix('-'))
        .unwrap_or(cleaned)
        .trim();
    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Comma-separated tags; `none`, `(none)` or blank mean no tags. Repeats collapse.
fn parse_tag_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("(none)") {
        return Vec::new();
    }
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
