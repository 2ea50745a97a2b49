use canonid::core::catalog::{self, CatalogRecord};
use canonid::core::config::Config;
use canonid::core::diagnostics::{DiagnosticKind, Diagnostics};
use canonid::core::error::CanonError;
use canonid::core::references;
use canonid::core::render;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

const INVARIANTS: &str = "# Invariants

## Replay

### <a id=\"INV-0001\"></a> INV-0001 — Replay is deterministic
**Status:** Active
**Tags:** replay

Given the same event log, replay yields the same state.

### <a id=\"INV-0002\"></a> INV-0002 - Events are append-only
**Status:** Active
**Tags:** storage, replay

## Examples

```markdown
### <a id=\"INV-0009\"></a> INV-0009 — Only an example
**Status:** Draft
```
";

const DOMAIN_MODEL: &str = "# Domain Model

## Core

### <a id=\"DM-0001\"></a> DM-0001 — Event
**Status:** Active
**Tags:** none

Relies on INV-0001.
";

const ACCEPTANCE_KILL: &str = "# Acceptance and Kill Criteria

## Acceptance

### <a id=\"AC-0001\"></a> AC-0001 — Replay matches recorded state
**Status:** Active
**Tags:** replay

## Kill

### <a id=\"KC-0001\"></a> KC-0001 — Replay diverges twice in a week
**Status:** Proposed
";

const TAXONOMY: &str = "# Tag Taxonomy

## Allowed Tags

- replay: deterministic re-execution
- storage

## Retired Tags

- legacy
";

const ADR: &str = "# ADR-0001: Use an event log

**Status:** Accepted

We store events, not state.
";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture() -> (TempDir, Config) {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    write(root, "docs/constitution/invariants.md", INVARIANTS);
    write(root, "docs/constitution/domain-model.md", DOMAIN_MODEL);
    write(root, "docs/constitution/acceptance-kill.md", ACCEPTANCE_KILL);
    write(root, "docs/constitution/tag-taxonomy.md", TAXONOMY);
    write(root, "docs/adr/0001-use-event-log.md", ADR);
    write(root, "docs/adr/README.md", "# Decision records\n");
    let config = Config::for_root(root);
    (tmp, config)
}

fn messages(diags: &Diagnostics) -> Vec<String> {
    diags.iter().map(|d| d.message.clone()).collect()
}

#[test]
fn builds_catalog_from_clean_corpus() {
    let (_tmp, config) = fixture();
    let (catalog, diags) = catalog::build_catalog(&config).unwrap();
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", messages(&diags));

    let ids: Vec<String> = catalog.entries.iter().map(|e| e.id.to_string()).collect();
    assert_eq!(ids, ["INV-0001", "INV-0002", "DM-0001", "AC-0001", "KC-0001"]);

    let inv2 = &catalog.entries[1];
    assert_eq!(inv2.title, "Events are append-only");
    assert_eq!(inv2.tags, ["storage", "replay"]);
    assert_eq!(inv2.section, "Replay");
    assert_eq!(inv2.href, "docs/constitution/invariants.md#INV-0002");
    assert!(catalog.entries[2].tags.is_empty(), "'none' means no tags");

    assert_eq!(catalog.decision_records.len(), 1, "README.md is not a record");
    let adr = &catalog.decision_records[0];
    assert_eq!(adr.id.to_string(), "ADR-0001");
    assert_eq!(adr.title, "Use an event log");
    assert_eq!(adr.status, "Accepted");

    let known = catalog.known_ids();
    assert!(known.contains("ADR-0001"));
    assert!(!known.contains("INV-0009"), "fenced definitions are not clauses");
}

#[test]
fn ids_round_trip_through_prefix_and_number() {
    let (_tmp, config) = fixture();
    let (catalog, _) = catalog::build_catalog(&config).unwrap();
    for e in &catalog.entries {
        assert_eq!(format!("{}-{:04}", e.prefix(), e.number()), e.id.to_string());
        assert_eq!(e.anchor, e.id.to_string());
    }
}

#[test]
fn same_id_in_two_documents_is_one_error_and_still_cataloged() {
    let (tmp, config) = fixture();
    let extra = format!(
        "{}\n### <a id=\"INV-0001\"></a> INV-0001 — Misplaced copy\n**Status:** Active\n",
        DOMAIN_MODEL
    );
    write(tmp.path(), "docs/constitution/domain-model.md", &extra);

    let (catalog, diags) = catalog::build_catalog(&config).unwrap();
    assert_eq!(
        messages(&diags),
        ["duplicate ID across files: INV-0001 appears in \
          [docs/constitution/invariants.md, docs/constitution/domain-model.md]"]
    );
    assert_eq!(diags.count_of(DiagnosticKind::DuplicateId), 1);
    let copies = catalog
        .entries
        .iter()
        .filter(|e| e.id.to_string() == "INV-0001")
        .count();
    assert_eq!(copies, 2, "extraction does not stop at the duplicate");
}

#[test]
fn decision_records_sharing_a_number_are_one_error() {
    let (tmp, config) = fixture();
    write(
        tmp.path(),
        "docs/adr/0001-other.md",
        "# ADR-0001: Another decision\n\n**Status:** Proposed\n",
    );

    let (catalog, diags) = catalog::build_catalog(&config).unwrap();
    assert_eq!(
        messages(&diags),
        ["duplicate ID across files: ADR-0001 appears in \
          [docs/adr/0001-other.md, docs/adr/0001-use-event-log.md]"]
    );
    assert_eq!(diags.count_of(DiagnosticKind::DuplicateId), 1);
    assert_eq!(catalog.decision_records.len(), 2);
    assert!(diags.failed(false));
}

#[test]
fn repeated_anchor_in_one_document_keeps_the_first() {
    let (tmp, config) = fixture();
    let doubled = format!(
        "{}\n### <a id=\"INV-0001\"></a> INV-0001 — Second definition\n**Status:** Active\n",
        INVARIANTS
    );
    write(tmp.path(), "docs/constitution/invariants.md", &doubled);

    let (catalog, diags) = catalog::build_catalog(&config).unwrap();
    assert_eq!(
        messages(&diags),
        ["docs/constitution/invariants.md: duplicate ID anchor found for INV-0001"]
    );
    let defs: Vec<&str> = catalog
        .entries
        .iter()
        .filter(|e| e.id.to_string() == "INV-0001")
        .map(|e| e.title.as_str())
        .collect();
    assert_eq!(defs, ["Replay is deterministic"]);
}

#[test]
fn unknown_tags_are_reported_per_occurrence() {
    let (tmp, config) = fixture();
    let tagged = INVARIANTS
        .replace("**Tags:** replay\n", "**Tags:** replay, legacy\n")
        .replace("**Tags:** storage, replay", "**Tags:** legacy");
    write(tmp.path(), "docs/constitution/invariants.md", &tagged);

    let (_, diags) = catalog::build_catalog(&config).unwrap();
    assert_eq!(
        messages(&diags),
        [
            "docs/constitution/invariants.md: INV-0001 uses unknown tag 'legacy' (not in tag-taxonomy.md allowlist)",
            "docs/constitution/invariants.md: INV-0002 uses unknown tag 'legacy' (not in tag-taxonomy.md allowlist)",
        ]
    );
}

#[test]
fn absent_taxonomy_disables_tag_validation() {
    let (tmp, config) = fixture();
    fs::remove_file(tmp.path().join("docs/constitution/tag-taxonomy.md")).unwrap();
    let tagged = INVARIANTS.replace("**Tags:** replay\n", "**Tags:** anything-goes\n");
    write(tmp.path(), "docs/constitution/invariants.md", &tagged);

    let (_, diags) = catalog::build_catalog(&config).unwrap();
    assert!(diags.is_empty(), "{:?}", messages(&diags));
}

#[test]
fn empty_taxonomy_is_fatal() {
    let (tmp, config) = fixture();
    write(
        tmp.path(),
        "docs/constitution/tag-taxonomy.md",
        "# Tags\n\n## Allowed Tags\n\n```\n- fenced: not a tag\n```\n",
    );
    let err = catalog::build_catalog(&config).unwrap_err();
    assert!(
        matches!(err, CanonError::EmptyTaxonomy(ref p) if p == "docs/constitution/tag-taxonomy.md"),
        "unexpected error: {}",
        err
    );
}

#[test]
fn missing_canonical_document_is_fatal() {
    let (tmp, config) = fixture();
    fs::remove_file(tmp.path().join("docs/constitution/acceptance-kill.md")).unwrap();
    let err = catalog::build_catalog(&config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing canonical doc: docs/constitution/acceptance-kill.md"
    );
}

#[test]
fn missing_status_is_reported() {
    let (tmp, config) = fixture();
    let bare = ACCEPTANCE_KILL.replace("**Status:** Proposed\n", "");
    write(tmp.path(), "docs/constitution/acceptance-kill.md", &bare);

    let (catalog, diags) = catalog::build_catalog(&config).unwrap();
    assert_eq!(
        messages(&diags),
        ["docs/constitution/acceptance-kill.md: KC-0001 is missing **Status:**"]
    );
    assert!(catalog.entries.iter().any(|e| e.id.to_string() == "KC-0001"));
}

#[test]
fn references_resolve_and_fenced_examples_are_ignored() {
    let (tmp, config) = fixture();
    write(
        tmp.path(),
        "docs/constitution.md",
        "# Constitution\n\nSee INV-0001, ADR-0001 and KC-0404.\n\n```text\nINV-0777 is illustrative\n```\n",
    );
    let (catalog, _) = catalog::build_catalog(&config).unwrap();

    let mut docs = config.canonical_doc_paths();
    docs.extend(config.reference_docs.iter().cloned());
    docs.push("docs/not-there.md".to_string());
    let refs = references::collect_references(&config, &docs).unwrap();
    assert!(!refs.contains_key("docs/not-there.md"));

    let mut diags = Diagnostics::new();
    references::check_references(&refs, &catalog.known_ids(), &mut diags);
    assert_eq!(
        messages(&diags),
        ["docs/constitution.md: references unknown ID KC-0404"]
    );
}

#[test]
fn generated_artifacts_are_reproducible_and_staleness_is_detected() {
    let (tmp, config) = fixture();
    let (catalog, _) = catalog::build_catalog(&config).unwrap();
    let artifacts = render::render_all(&catalog, &config).unwrap();

    let mut diags = Diagnostics::new();
    render::check_generated(&config, &artifacts, &mut diags).unwrap();
    assert_eq!(diags.count_of(DiagnosticKind::StaleArtifact), 1, "nothing persisted yet");

    assert!(render::write_artifacts(&config, &artifacts).unwrap());
    let (rebuilt, _) = catalog::build_catalog(&config).unwrap();
    let again = render::render_all(&rebuilt, &config).unwrap();
    assert_eq!(artifacts, again);
    assert!(!render::write_artifacts(&config, &again).unwrap());

    let mut diags = Diagnostics::new();
    render::check_generated(&config, &again, &mut diags).unwrap();
    assert!(diags.is_empty());

    write(tmp.path(), "docs/constitution/id-index-by-tag.md", "hand edited\n");
    let mut diags = Diagnostics::new();
    render::check_generated(&config, &again, &mut diags).unwrap();
    assert_eq!(
        messages(&diags),
        ["generated files are out of date:\n  - docs/constitution/id-index-by-tag.md\n\
          Run: canonid generate --write"]
    );
}

#[test]
fn persisted_catalog_feeds_known_ids() {
    let (tmp, config) = fixture();
    assert!(catalog::load_known_ids(&config).is_none());

    let (catalog, _) = catalog::build_catalog(&config).unwrap();
    render::write_artifacts(&config, &render::render_all(&catalog, &config).unwrap()).unwrap();

    let known = catalog::load_known_ids(&config).unwrap();
    assert_eq!(known, catalog.known_ids());

    let json = fs::read_to_string(tmp.path().join("docs/constitution/id-catalog.json")).unwrap();
    let rows: Vec<CatalogRecord> = serde_json::from_str(&json).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["AC-0001", "DM-0001", "INV-0001", "INV-0002", "KC-0001", "ADR-0001"]);

    write(tmp.path(), "docs/constitution/id-catalog.json", "not json");
    assert!(catalog::load_known_ids(&config).is_none());
}
