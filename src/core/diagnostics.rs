//! Accumulated, non-fatal validation results.
//!
//! Extraction and validation never stop at the first problem: every finding
//! is pushed here and the whole list is reported at once. Conditions that
//! make further work meaningless are [`crate::core::error::CanonError`]
//! instead.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    /// Informational; never counted and never escalated.
    Notice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    // Catalog construction
    DuplicateAnchor,
    DuplicateId,
    MissingStatus,
    UnknownTag,
    UnknownReference,
    StaleArtifact,
    // Trace block
    MissingTraceBlock,
    MissingTraceField,
    SpecNotFound,
    MissingSpecIssue,
    IssueMismatch,
    SpecNotReferenced,
    TrivialEscapeMisapplied,
    SpecPathMismatch,
    CatalogUnavailable,
    // Spec lint
    Unreadable,
    MissingFrontmatter,
    MissingFrontmatterField,
    InvalidStatus,
    MissingSection,
    EmptySection,
    MissingTier0,
    EmptyTier0,
    UnresolvedConcept,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Ordered list of findings. Nothing is deduplicated or reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            kind,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            kind,
            message: message.into(),
        });
    }

    pub fn notice(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Notice,
            kind,
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn notices(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Notice)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of findings of `kind`, any severity.
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    /// Whether the run should fail. Warnings count only when escalated;
    /// notices never do.
    pub fn failed(&self, warnings_as_errors: bool) -> bool {
        self.has_errors() || (warnings_as_errors && self.warning_count() > 0)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
