//! Architecture decision records: one `NNNN-slug.md` file per decision.

use crate::core::config::Config;
use crate::core::error::CanonError;
use crate::core::files;
use crate::core::ids::{ClauseId, Prefix};
use regex::Regex;
use std::fs;
use std::sync::LazyLock;

pub const UNKNOWN_STATUS: &str = "Unknown";

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<num>\d{4})-(?P<slug>.+)\.md$").unwrap());
static TITLE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^ADR-\d+[:\s—-]*").unwrap());
static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\*\*Status:\*\*\s*(?P<status>.+?)\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRecord {
    pub id: ClauseId,
    pub title: String,
    pub status: String,
    pub file: String,
    /// Same as `file`: records are addressed as whole documents.
    pub href: String,
}

impl DecisionRecord {
    pub fn number(&self) -> u16 {
        self.id.number
    }
}

/// Build a record from a file name and its content. `None` when the name
/// does not follow the `NNNN-slug.md` convention.
pub fn parse_decision_record(file_name: &str, md: &str, file: &str) -> Option<DecisionRecord> {
    let caps = FILENAME_RE.captures(file_name)?;
    let number: u16 = caps["num"].parse().ok()?;

    let mut title: Option<String> = None;
    let mut body_status: Option<String> = None;
    let mut key_status: Option<String> = None;

    for line in md.lines() {
        if title.is_none()
            && let Some(heading) = line.strip_prefix("# ")
        {
            title = Some(TITLE_LABEL_RE.replace(heading.trim(), "").trim().to_string());
            continue;
        }
        let trimmed = line.trim();
        if body_status.is_none()
            && let Some(c) = STATUS_RE.captures(trimmed)
        {
            body_status = Some(c["status"].trim().to_string());
            continue;
        }
        if key_status.is_none()
            && let Some(value) = trimmed.strip_prefix("status:")
        {
            key_status = Some(value.trim().trim_matches('"').trim_matches('\'').to_string());
        }
    }

    let title = title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_from_slug(&caps["slug"]));
    let status = body_status
        .or(key_status)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string());

    Some(DecisionRecord {
        id: ClauseId::new(Prefix::Adr, number),
        title,
        status,
        file: file.to_string(),
        href: file.to_string(),
    })
}

/// Every decision record in the configured directory, in file name order.
/// A missing directory yields no records.
pub fn collect_decision_records(config: &Config) -> Result<Vec<DecisionRecord>, CanonError> {
    let dir = config.abs(&config.adr_dir);
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "no decision record directory");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::new();
    for path in paths {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !FILENAME_RE.is_match(file_name) {
            continue;
        }
        let md = files::read_text(&path)?;
        if let Some(record) = parse_decision_record(file_name, &md, &config.rel(&path)) {
            records.push(record);
        }
    }
    tracing::debug!(records = records.len(), "collected decision records");
    Ok(records)
}

/// `use-event-sourcing` -> `Use Event Sourcing`.
fn title_from_slug(slug: &str) -> String {
    let spaced = slug.replace(['-', '_'], " ");
    let mut out = String::with_capacity(spaced.len());
    let mut prev_alpha = false;
    for ch in spaced.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
