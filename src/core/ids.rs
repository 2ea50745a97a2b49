//! Identifier grammar.
//!
//! A clause identifier is `PREFIX-NNNN`: one of the fixed prefixes followed
//! by exactly four decimal digits. `INV-0001` and `INV-1` are different
//! tokens and only the four-digit form is recognized.
//!
//! Decision records share the token shape (`ADR-NNNN`) but are addressed by
//! whole document, never by an in-document anchor.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Any identifier-shaped token, clause or decision record.
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:INV|DM|AC|KC|ADR)-\d{4}\b").unwrap());

/// Anchor marker embedded in a heading. Only clause prefixes are anchorable.
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i:<a\s+id=)"(?P<id>(?:INV|DM|AC|KC)-\d{4})"(?i:\s*>\s*</a>)"#).unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Prefix {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "ADR")]
    Adr,
    #[serde(rename = "DM")]
    Dm,
    #[serde(rename = "INV")]
    Inv,
    #[serde(rename = "KC")]
    Kc,
}

impl Prefix {
    /// Clause prefixes in index rendering order.
    pub const CLAUSES: [Prefix; 4] = [Prefix::Inv, Prefix::Dm, Prefix::Ac, Prefix::Kc];

    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Ac => "AC",
            Prefix::Adr => "ADR",
            Prefix::Dm => "DM",
            Prefix::Inv => "INV",
            Prefix::Kc => "KC",
        }
    }

    /// Heading used for this prefix's group in the by-prefix index.
    pub fn index_title(self) -> &'static str {
        match self {
            Prefix::Ac => "Acceptance Criteria",
            Prefix::Adr => "Architecture Decision Records",
            Prefix::Dm => "Domain Model",
            Prefix::Inv => "Invariants",
            Prefix::Kc => "Kill Criteria",
        }
    }

    pub fn is_clause(self) -> bool {
        self != Prefix::Adr
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AC" => Ok(Prefix::Ac),
            "ADR" => Ok(Prefix::Adr),
            "DM" => Ok(Prefix::Dm),
            "INV" => Ok(Prefix::Inv),
            "KC" => Ok(Prefix::Kc),
            other => Err(format!("unknown identifier prefix '{}'", other)),
        }
    }
}

/// A parsed `PREFIX-NNNN` identifier.
///
/// Ordering is `(prefix, number)` with prefixes compared by their textual
/// form, which is the sort order of every generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseId {
    pub prefix: Prefix,
    pub number: u16,
}

impl ClauseId {
    pub fn new(prefix: Prefix, number: u16) -> Self {
        Self { prefix, number }
    }
}

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}", self.prefix, self.number)
    }
}

impl FromStr for ClauseId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, digits) = s
            .split_once('-')
            .ok_or_else(|| format!("'{}' is not a PREFIX-NNNN identifier", s))?;
        let prefix: Prefix = prefix.parse()?;
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("'{}' must end in exactly four digits", s));
        }
        let number = digits
            .parse::<u16>()
            .map_err(|e| format!("'{}': {}", s, e))?;
        Ok(Self { prefix, number })
    }
}

impl Serialize for ClauseId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every identifier-shaped token in `text`, in order of appearance.
///
/// Callers that want definitions or references from a document should pass
/// fence-stripped text (see [`crate::core::markdown::strip_fences`]).
pub fn find_ids(text: &str) -> Vec<String> {
    ID_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Clause id carried by an anchor marker in `heading_text`, if any.
pub fn find_anchor(heading_text: &str) -> Option<String> {
    ANCHOR_RE
        .captures(heading_text)
        .map(|c| c["id"].to_string())
}

/// `heading_text` with every anchor marker removed.
pub fn remove_anchors(heading_text: &str) -> String {
    ANCHOR_RE.replace_all(heading_text, "").into_owned()
}
