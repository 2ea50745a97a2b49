use canonid::core::config::Config;
use canonid::core::diagnostics::{DiagnosticKind, Severity};
use canonid::core::spec_lint;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn spec(status: &str, tier0: &str, extra: &str) -> String {
    format!(
        "---
title: Replay cache
status: {status}
issue: 42
---

# FS-0042: Replay cache

## Problem
Replays are slow.

## Trace Map
- INV-0001

## Domain Concepts
- DM-0001 Event

## Interfaces
`ReplayCache::get`

## Determinism Notes
Keyed by log offset only.

## Gate Plan

### Tier 0
{tier0}

### Tier 1
- [ ] soak test

## Acceptance Criteria
- AC-0001
{extra}"
    )
}

fn known() -> BTreeSet<String> {
    ["INV-0001", "DM-0001", "AC-0001"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn fixture() -> (TempDir, Config) {
    let tmp = tempdir().unwrap();
    write(tmp.path(), "docs/specs/FS-0042-replay-cache.md", &spec("Draft", "- [ ] unit tests", ""));
    write(tmp.path(), "docs/specs/FS-0007-typo.md", &spec("Implemented", "- [x] spellcheck", ""));
    write(tmp.path(), "docs/specs/_TEMPLATE.md", "---\n---\n");
    write(tmp.path(), "docs/specs/README.md", "# Specs\n");
    write(tmp.path(), "docs/specs/notes.txt", "not a spec\n");
    let config = Config::for_root(tmp.path());
    (tmp, config)
}

#[test]
fn all_specs_skips_templates_and_non_markdown() {
    let (tmp, config) = fixture();
    let specs = spec_lint::all_specs(&config).unwrap();
    assert_eq!(
        specs,
        [
            tmp.path().join("docs/specs/FS-0007-typo.md"),
            tmp.path().join("docs/specs/FS-0042-replay-cache.md"),
        ]
    );
    for path in &specs {
        let diags = spec_lint::lint_spec_file(&config, path, Some(&known()));
        assert!(diags.is_empty(), "{}: {:?}", path.display(), diags);
    }
}

#[test]
fn missing_specs_dir_means_nothing_to_lint() {
    let tmp = tempdir().unwrap();
    let config = Config::for_root(tmp.path());
    assert!(spec_lint::all_specs(&config).unwrap().is_empty());
}

#[test]
fn changed_specs_are_filtered_to_existing_lintable_specs() {
    let (tmp, config) = fixture();
    let changed: Vec<String> = [
        "src/lib.rs",
        "docs/specs/FS-0042-replay-cache.md",
        "docs/specs/_TEMPLATE.md",
        "docs/specs/FS-0099-deleted.md",
        "docs/specs/notes.txt",
        "docs/specs-archive/FS-0001-old.md",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(
        spec_lint::changed_specs(&config, &changed),
        [tmp.path().join("docs/specs/FS-0042-replay-cache.md")]
    );
}

#[test]
fn messages_are_labelled_with_the_root_relative_path() {
    let (tmp, config) = fixture();
    let path = tmp.path().join("docs/specs/FS-0042-replay-cache.md");
    write(tmp.path(), "docs/specs/FS-0042-replay-cache.md", &spec("Shipped", "- [ ] a", ""));
    let diags = spec_lint::lint_spec_file(&config, &path, Some(&known()));
    let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        ["docs/specs/FS-0042-replay-cache.md: Invalid status 'Shipped' (must be one of: Draft, Approved, Implemented)"]
    );
}

#[test]
fn unresolved_concept_blocks_approval_only() {
    let (tmp, config) = fixture();
    let path = tmp.path().join("docs/specs/FS-0042-replay-cache.md");

    write(
        tmp.path(),
        "docs/specs/FS-0042-replay-cache.md",
        &spec("Approved", "- [ ] unit tests", "\nIntroduces NEW: Widget for caching.\n"),
    );
    let diags = spec_lint::lint_spec_file(&config, &path, Some(&known()));
    let found: Vec<(Severity, &str)> = diags.iter().map(|d| (d.severity, d.message.as_str())).collect();
    assert_eq!(
        found,
        [(
            Severity::Error,
            "docs/specs/FS-0042-replay-cache.md: Status is 'Approved' but contains unresolved 'NEW: Widget' (must resolve to DM-* before approval)"
        )]
    );

    write(
        tmp.path(),
        "docs/specs/FS-0042-replay-cache.md",
        &spec("Draft", "- [ ] unit tests", "\nIntroduces NEW: Widget for caching.\n"),
    );
    let diags = spec_lint::lint_spec_file(&config, &path, Some(&known()));
    assert_eq!(diags.error_count(), 0);
    assert_eq!(diags.warning_count(), 1);
    assert_eq!(
        diags.iter().next().unwrap().message,
        "docs/specs/FS-0042-replay-cache.md: Draft spec contains 'NEW: Widget' (resolve before approval)"
    );
}

#[test]
fn tier0_without_checkbox_is_exactly_one_error() {
    let (tmp, config) = fixture();
    let path = tmp.path().join("docs/specs/FS-0042-replay-cache.md");
    write(
        tmp.path(),
        "docs/specs/FS-0042-replay-cache.md",
        &spec("Draft", "Run the unit tests.", ""),
    );
    let diags = spec_lint::lint_spec_file(&config, &path, Some(&known()));
    assert_eq!(diags.error_count(), 1);
    assert_eq!(diags.count_of(DiagnosticKind::EmptyTier0), 1);
    assert_eq!(diags.count_of(DiagnosticKind::MissingTier0), 0);
    assert!(
        diags.iter().next().unwrap().message.ends_with("Tier 0 gate plan must have at least one bullet item")
    );
}

#[test]
fn fenced_identifiers_are_not_references() {
    let (tmp, config) = fixture();
    let path = tmp.path().join("docs/specs/FS-0042-replay-cache.md");
    write(
        tmp.path(),
        "docs/specs/FS-0042-replay-cache.md",
        &spec(
            "Draft",
            "- [ ] unit tests",
            "\n```text\nKC-0404 and NEW: Gadget are illustrative\n```\nSee AC-0404.\n",
        ),
    );
    let diags = spec_lint::lint_spec_file(&config, &path, Some(&known()));
    let messages: Vec<&str> = diags.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        ["docs/specs/FS-0042-replay-cache.md: References unknown ID: AC-0404"]
    );
}

#[test]
fn unreadable_spec_is_reported_not_fatal() {
    let (tmp, config) = fixture();
    let path = tmp.path().join("docs/specs/FS-0404-missing.md");
    let diags = spec_lint::lint_spec_file(&config, &path, None);
    assert_eq!(diags.error_count(), 1);
    assert_eq!(diags.count_of(DiagnosticKind::Unreadable), 1);
    assert!(diags.iter().next().unwrap().message.starts_with("docs/specs/FS-0404-missing.md: Cannot read file:"));
}

#[test]
fn spec_without_frontmatter_defaults_to_draft() {
    let (tmp, config) = fixture();
    let path = tmp.path().join("docs/specs/FS-0042-replay-cache.md");
    let body = spec("Draft", "- [ ] unit tests", "\nNEW: Widget\n");
    let without = body.split_once("---\n\n").unwrap().1;
    write(tmp.path(), "docs/specs/FS-0042-replay-cache.md", without);
    let diags = spec_lint::lint_spec_file(&config, &path, Some(&known()));
    let kinds: Vec<DiagnosticKind> = diags.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        [DiagnosticKind::MissingFrontmatter, DiagnosticKind::UnresolvedConcept]
    );
    assert_eq!(diags.warning_count(), 1);
}
