//! canonid: referential integrity for a documentation constitution.
//!
//! A constitution is a small set of canonical markdown documents whose
//! clauses carry stable identifiers (`INV-0001`, `DM-0003`, `AC-0002`,
//! `KC-0001`), plus a directory of architecture decision records
//! (`ADR-0004`). Specs and pull-request bodies cite those identifiers.
//!
//! canonid guarantees that:
//!
//! - every identifier is well-formed and defined exactly once
//! - every tag on a clause is in the taxonomy allowlist
//! - every cited identifier resolves
//! - the generated indices and JSON catalog are a byte-for-byte
//!   reproducible function of the sources
//! - a delivery artifact's trace block and its spec agree on the issue
//!
//! # Examples
//!
//! ```bash
//! # Regenerate the indices and catalog
//! canonid generate --write
//!
//! # Validate everything without writing
//! canonid check
//!
//! # Validate a PR body
//! gh pr view 42 --json body -q .body | canonid trace
//!
//! # Lint specs touched in the working tree
//! canonid spec-lint --changed
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: parsing, catalog construction, rendering, and validation.
//!   Every entry point takes an explicit [`core::config::Config`].

pub mod core;

mod cli;

use crate::cli::{Cli, Command};
use crate::core::catalog;
use crate::core::config::Config;
use crate::core::diagnostics::{DiagnosticKind, Diagnostics};
use crate::core::error::CanonError;
use crate::core::files;
use crate::core::git;
use crate::core::output::{self, OutputFormat};
use crate::core::references;
use crate::core::render;
use crate::core::spec_lint;
use crate::core::trace;

use clap::Parser;
use std::io::Read;
use std::path::{Path, PathBuf};

const LOG_ENV: &str = "CANONID_LOG";

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    // A second initialisation (embedding, tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse the command line and run one command. `Ok(false)` means the run
/// completed but collected blocking diagnostics.
pub fn run() -> Result<bool, CanonError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let root = match cli.root {
        Some(r) => absolute(&r),
        None => absolute(&std::env::current_dir()?),
    };
    let config = Config::load(&root, cli.config.as_deref())?;
    tracing::debug!(root = %config.root.display(), "resolved repository root");

    match cli.command {
        Command::Generate { write } => run_generate(&config, write),
        Command::Check {
            no_generated_check,
            format,
        } => run_check(&config, !no_generated_check, format),
        Command::Trace {
            file,
            warnings_as_errors,
            format,
        } => run_trace(&config, file.as_deref(), warnings_as_errors, format),
        Command::SpecLint {
            files,
            changed,
            warnings_as_errors,
            format,
        } => run_spec_lint(&config, &files, changed, warnings_as_errors, format),
    }
}

fn run_generate(config: &Config, write: bool) -> Result<bool, CanonError> {
    let (catalog, diags) = catalog::build_catalog(config)?;
    let artifacts = render::render_all(&catalog, config)?;

    if write {
        if render::write_artifacts(config, &artifacts)? {
            println!("Generated files updated.");
        } else {
            println!("Generated files already up to date.");
        }
    } else {
        for artifact in &artifacts {
            println!("\n# ===== {} =====\n", artifact.path);
            print!("{}", artifact.content);
        }
    }

    // Structural problems still fail a generate run.
    output::emit(&diags, OutputFormat::Text)?;
    Ok(!diags.failed(false))
}

fn run_check(config: &Config, check_generated: bool, format: OutputFormat) -> Result<bool, CanonError> {
    let (catalog, mut diags) = catalog::build_catalog(config)?;
    let known = catalog.known_ids();

    let mut docs = config.canonical_doc_paths();
    docs.extend(config.reference_docs.iter().cloned());
    let refs = references::collect_references(config, &docs)?;
    references::check_references(&refs, &known, &mut diags);

    if check_generated {
        let artifacts = render::render_all(&catalog, config)?;
        render::check_generated(config, &artifacts, &mut diags)?;
    }

    output::emit(&diags, format)?;
    if diags.failed(false) {
        output::summary(format, format!("Check failed: {}", output::counts(&diags)));
        return Ok(false);
    }
    output::summary(
        format,
        "OK: IDs, tags, references, and generated artifacts are valid.",
    );
    Ok(true)
}

fn run_trace(
    config: &Config,
    file: Option<&Path>,
    warnings_as_errors: bool,
    format: OutputFormat,
) -> Result<bool, CanonError> {
    let text = match file {
        Some(path) => files::read_text(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if text.trim().is_empty() {
        return Err(CanonError::EmptyInput);
    }

    let known = catalog::load_known_ids(config);
    let diags = trace::validate_trace(&text, known.as_ref(), config)?;

    output::emit(&diags, format)?;
    finish_validation(&diags, warnings_as_errors, format, "Trace validation", "")
}

fn run_spec_lint(
    config: &Config,
    paths: &[PathBuf],
    changed: bool,
    warnings_as_errors: bool,
    format: OutputFormat,
) -> Result<bool, CanonError> {
    let specs: Vec<PathBuf> = if !paths.is_empty() {
        let cwd = std::env::current_dir()?;
        paths.iter().map(|p| absolute(&cwd.join(p))).collect()
    } else if changed {
        let specs = spec_lint::changed_specs(config, &git::changed_files(config)?);
        if specs.is_empty() {
            output::summary(format, "No changed specs found.");
            return Ok(true);
        }
        specs
    } else {
        spec_lint::all_specs(config)?
    };
    if specs.is_empty() {
        output::summary(format, "No specs found to lint.");
        return Ok(true);
    }

    let known = catalog::load_known_ids(config);
    let mut diags = Diagnostics::new();
    if known.is_none() {
        diags.notice(
            DiagnosticKind::CatalogUnavailable,
            "Could not load ID catalog; skipping ID validation",
        );
    }
    let mut sorted = specs;
    sorted.sort();
    for spec in &sorted {
        diags.extend(spec_lint::lint_spec_file(config, spec, known.as_ref()));
    }
    tracing::info!(specs = sorted.len(), errors = diags.error_count(), "linted specs");

    output::emit(&diags, format)?;
    let checked = format!(": {} spec(s) checked", sorted.len());
    finish_validation(&diags, warnings_as_errors, format, "Spec lint", &checked)
}

/// Canonical form of `path` so root-relative labels strip cleanly; the path
/// as given when it cannot be resolved (missing files report themselves).
fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Print the pass/fail summary shared by `trace` and `spec-lint`.
fn finish_validation(
    diags: &Diagnostics,
    warnings_as_errors: bool,
    format: OutputFormat,
    what: &str,
    detail: &str,
) -> Result<bool, CanonError> {
    if diags.has_errors() {
        output::summary(format, format!("{} failed: {}", what, output::counts(diags)));
        return Ok(false);
    }
    if diags.failed(warnings_as_errors) {
        output::summary(
            format,
            format!(
                "{} failed (warnings as errors): {} warning(s)",
                what,
                diags.warning_count()
            ),
        );
        return Ok(false);
    }
    let warnings = if detail.is_empty() {
        format!(" ({} warning(s))", diags.warning_count())
    } else {
        format!(", {} warning(s)", diags.warning_count())
    };
    output::summary(format, format!("{} passed{}{}", what, detail, warnings));
    Ok(true)
}
