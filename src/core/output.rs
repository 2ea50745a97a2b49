//! Diagnostic rendering for CLI surfaces.
//!
//! Text mode writes a flat bulleted list to stderr, notices then warnings then
//! errors, and leaves stdout for the one-line summary. JSON mode writes a
//! single `{errors, warnings}` document to stdout; notices go to stderr.

use crate::core::diagnostics::{Diagnostic, Diagnostics};
use crate::core::error::CanonError;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    errors: Vec<&'a Diagnostic>,
    warnings: Vec<&'a Diagnostic>,
}

/// `{ "errors": [...], "warnings": [...] }`, pretty-printed.
pub fn render_json(diags: &Diagnostics) -> Result<String, CanonError> {
    let report = Report {
        errors: diags.errors().collect(),
        warnings: diags.warnings().collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Headed bullet lists, notices then warnings then errors. Empty when there
/// is nothing to say.
pub fn render_text(diags: &Diagnostics) -> String {
    let mut out = render_notices(diags);
    let warnings: Vec<&str> = diags.warnings().map(|d| d.message.as_str()).collect();
    if !warnings.is_empty() {
        out.push_str(&format!("{}\n", "WARNINGS:".yellow().bold()));
        out.push_str(&bullets(&warnings));
        out.push('\n');
    }
    let errors: Vec<&str> = diags.errors().map(|d| d.message.as_str()).collect();
    if !errors.is_empty() {
        out.push_str(&format!("{}\n", "ERRORS:".red().bold()));
        out.push_str(&bullets(&errors));
        out.push('\n');
    }
    out
}

fn render_notices(diags: &Diagnostics) -> String {
    diags
        .notices()
        .map(|d| format!("{} {}\n", "NOTE:".cyan().bold(), d.message))
        .collect()
}

fn bullets(messages: &[&str]) -> String {
    messages.iter().map(|m| format!("  - {}\n", m)).collect()
}

/// Emit `diags` in `format`. In text mode nothing is written when empty.
pub fn emit(diags: &Diagnostics, format: OutputFormat) -> Result<(), CanonError> {
    match format {
        OutputFormat::Json => {
            let notices = render_notices(diags);
            if !notices.is_empty() {
                let mut stderr = io::stderr().lock();
                write!(stderr, "{}", notices)?;
            }
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", render_json(diags)?)?;
        }
        OutputFormat::Text => {
            let text = render_text(diags);
            if !text.is_empty() {
                let mut stderr = io::stderr().lock();
                write!(stderr, "{}", text)?;
            }
        }
    }
    Ok(())
}

/// Summary line, printed on stdout in text mode only.
pub fn summary(format: OutputFormat, line: impl AsRef<str>) {
    if format == OutputFormat::Text {
        println!("{}", line.as_ref());
    }
}

/// `"N error(s), M warning(s)"`.
pub fn counts(diags: &Diagnostics) -> String {
    format!(
        "{} error(s), {} warning(s)",
        diags.error_count(),
        diags.warning_count()
    )
}
