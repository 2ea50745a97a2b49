//! CLI struct definitions for the canonid command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use crate::core::output::OutputFormat;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "canonid",
    version = env!("CARGO_PKG_VERSION"),
    about = "Keeps constitution clause IDs unique and resolvable, regenerates the ID indices, and checks that specs and PR bodies trace back to them."
)]
pub(crate) struct Cli {
    /// Repository root (defaults to the current directory).
    #[clap(long, global = true)]
    pub root: Option<PathBuf>,
    /// Config file (defaults to `<root>/canonid.toml` when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Debug logging on stderr.
    #[clap(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,
    /// Errors-only logging.
    #[clap(long, short = 'q', global = true)]
    pub quiet: bool,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Build the catalog and render the ID indices and JSON catalog
    #[clap(name = "generate", visible_alias = "g")]
    Generate {
        /// Persist the artifacts instead of printing them.
        #[clap(long)]
        write: bool,
    },

    /// Validate IDs, tags, references, and generated artifact freshness
    #[clap(name = "check", visible_alias = "c")]
    Check {
        /// Skip the comparison against persisted artifacts.
        #[clap(long)]
        no_generated_check: bool,
        #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Validate the trace block of a PR body or other delivery text
    #[clap(name = "trace", visible_alias = "t")]
    Trace {
        /// Read from this file instead of stdin.
        #[clap(long)]
        file: Option<PathBuf>,
        #[clap(long)]
        warnings_as_errors: bool,
        #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Lint spec documents (all specs by default)
    #[clap(name = "spec-lint", visible_alias = "s")]
    SpecLint {
        /// Specific spec files to lint.
        files: Vec<PathBuf>,
        /// Only specs changed in the working tree or index.
        #[clap(long, conflicts_with = "files")]
        changed: bool,
        #[clap(long)]
        warnings_as_errors: bool,
        #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}
