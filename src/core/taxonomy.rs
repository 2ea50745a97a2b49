//! Tag allowlist from the taxonomy document's `## Allowed Tags` section.

use crate::core::markdown::{BlockKind, Document};
use std::collections::BTreeSet;

const ALLOWED_TAGS_HEADING: &str = "allowed tags";

/// Loaded allowlist plus the document it came from, for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAllowlist {
    pub source: String,
    pub tags: BTreeSet<String>,
}

impl TagAllowlist {
    pub fn new(source: impl Into<String>, tags: BTreeSet<String>) -> Self {
        Self {
            source: source.into(),
            tags,
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// File name of the taxonomy document (`tag-taxonomy.md`).
    pub fn source_name(&self) -> &str {
        self.source.rsplit('/').next().unwrap_or(&self.source)
    }
}

/// Allowed tag names: each `- name` or `- name: description` bullet under the
/// `## Allowed Tags` heading (case-insensitive), up to the next H2.
///
/// An empty result is returned as-is; deciding that an empty allowlist is
/// fatal belongs to the caller that knows the document exists.
pub fn parse_allowed_tags(md: &str) -> BTreeSet<String> {
    let doc = Document::parse(md);
    let mut allowed = BTreeSet::new();

    for section in doc.sections(2) {
        if !section.title.eq_ignore_ascii_case(ALLOWED_TAGS_HEADING) {
            continue;
        }
        // Text directly under the H2 and under any deeper subheading both count.
        for block in &doc.blocks()[section.body.clone()] {
            if block.kind != BlockKind::Text {
                continue;
            }
            for line in doc.lines_of(block) {
                let Some(item) = line.trim().strip_prefix("- ") else {
                    continue;
                };
                let name = match item.split_once(':') {
                    Some((name, _)) => name,
                    None => item,
                };
                let name = name.trim();
                if !name.is_empty() {
                    allowed.insert(name.to_string());
                }
            }
        }
    }
    allowed
}
